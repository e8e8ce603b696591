//! # countwatch
//!
//! Tracks a monotonically growing cumulative counter from manually entered
//! samples and forecasts when it will cross a fixed target threshold.
//!
//! ## Architecture
//!
//! ```text
//!   SampleStore ──► sanitize ──► Series ──┬─► windowed mean rate ─► average crossing
//!   (load/append)                         ├─► least-squares fit  ─► linear crossing
//!                                         └─► time-of-day bucket stats
//! ```
//!
//! Data flows one way: the store yields raw samples, the sanitizer derives
//! an ephemeral annotated series, and the two estimators extrapolate the
//! target crossing independently. The gap between the two predictions is
//! left to the consumer as diagnostic signal.
//!
//! Everything is single-threaded and synchronous. Each call performs a full
//! load–compute(–store) cycle; the sample store is the sole shared
//! resource, and concurrent appends race on its full-file rewrite (last
//! writer wins — acceptable for a manually triggered workload).
//!
//! ## Quick Start
//!
//! ```rust
//! use countwatch::{InMemoryStore, Tracker, TrackerConfig};
//! use chrono::NaiveDate;
//!
//! let store = InMemoryStore::new();
//! let tracker = Tracker::new(TrackerConfig {
//!     target: 1000,
//!     ..TrackerConfig::default()
//! });
//!
//! let t0 = NaiveDate::from_ymd_opt(2025, 11, 20)
//!     .unwrap()
//!     .and_hms_opt(9, 0, 0)
//!     .unwrap();
//! tracker.ingest_at(&store, 100, t0).unwrap();
//! tracker.ingest_at(&store, 150, t0 + chrono::Duration::minutes(10)).unwrap();
//!
//! let report = tracker.forecast(&store, None).unwrap();
//! assert_eq!(report.remaining, 850);
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod forecast;
pub mod rates;
pub mod sample;
pub mod series;
pub mod store;
pub mod tracker;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use error::{ForecastError, ForecastResult};
pub use forecast::{
    average_projection, regression_projection, AverageProjection, LinearProjection,
};
pub use rates::{
    coarse_bucket_stats, fine_bucket_stats, windowed_mean_rate, BucketStats, CoarseBucket,
    FineBucket,
};
pub use sample::Sample;
pub use series::{
    sanitize, DiscardCounts, SanitizeStage, Series, SeriesPoint, MIN_SAMPLES,
};
pub use store::{InMemoryStore, JsonFileStore, SampleStore};
pub use tracker::{
    CurrentStatus, ForecastReport, Tracker, TrackerConfig, DEFAULT_COUNT_CEILING,
    DEFAULT_RATE_WINDOW, DEFAULT_TARGET,
};
