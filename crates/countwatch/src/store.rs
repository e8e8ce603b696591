//! Sample store — the durable ordered collection of counter samples.
//!
//! The store exclusively owns the persisted sequence; callers always get
//! copies. `append` rewrites the full sequence atomically (write to `.tmp`,
//! then rename), which is sufficient for a manual, low-frequency sampling
//! cadence. Concurrent appenders race on that rewrite: last writer wins.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::{ForecastError, ForecastResult};
use crate::sample::Sample;

/// Persistence contract for the sample sequence.
///
/// No indexing, no querying beyond a full-sequence load: the dataset stays
/// small (hundreds to low thousands of rows).
pub trait SampleStore {
    /// Load the full persisted sequence, oldest append first.
    ///
    /// An absent or empty store is `Ok` with an empty vector; an unreadable
    /// or unparsable one is `CorruptStore`.
    fn load(&self) -> ForecastResult<Vec<Sample>>;

    /// Persist one more sample at the end of the sequence.
    fn append(&self, sample: Sample) -> ForecastResult<()>;

    /// Load, degrading an unreadable store to an empty sequence.
    ///
    /// Corruption is recoverable: the next `append` rewrites the file. No
    /// read path is allowed to take the process down.
    fn load_or_empty(&self) -> Vec<Sample> {
        match self.load() {
            Ok(samples) => samples,
            Err(e) => {
                warn!(error = %e, "sample store unreadable, treating as empty");
                Vec::new()
            }
        }
    }
}

/// JSON-file backed sample store.
///
/// The file holds a pretty-printed JSON array of sample records and stays
/// human-diffable. Appending loads the current sequence, pushes, and
/// rewrites the whole file through a `.tmp` + rename so a reader never
/// observes a partially written sequence.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleStore for JsonFileStore {
    fn load(&self) -> ForecastResult<Vec<Sample>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| ForecastError::CorruptStore(format!("read failed: {}", e)))?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .map_err(|e| ForecastError::CorruptStore(format!("deserialization failed: {}", e)))
    }

    fn append(&self, sample: Sample) -> ForecastResult<()> {
        // A corrupt file is clobbered here: the degraded empty load means
        // the rewritten sequence starts over from this sample.
        let mut samples = self.load_or_empty();
        samples.push(sample);

        let json = serde_json::to_string_pretty(&samples)
            .map_err(|e| ForecastError::Persistence(format!("serialization failed: {}", e)))?;

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

/// In-memory sample store (for testing).
pub struct InMemoryStore {
    samples: Mutex<Vec<Sample>>,
}

impl InMemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(Vec::new()),
        }
    }

    /// Create a store pre-seeded with samples.
    pub fn with_samples(samples: Vec<Sample>) -> Self {
        Self {
            samples: Mutex::new(samples),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleStore for InMemoryStore {
    fn load(&self) -> ForecastResult<Vec<Sample>> {
        let samples = self
            .samples
            .lock()
            .map_err(|_| ForecastError::Persistence("lock poisoned".into()))?;
        Ok(samples.clone())
    }

    fn append(&self, sample: Sample) -> ForecastResult<()> {
        let mut samples = self
            .samples
            .lock()
            .map_err(|_| ForecastError::Persistence("lock poisoned".into()))?;
        samples.push(sample);
        Ok(())
    }
}
