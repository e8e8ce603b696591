//! Tracker entry points: ingestion, status, and the full forecast cycle.
//!
//! The tracker holds configuration only. The sample store is an explicit
//! dependency passed into each call, and every call performs a complete
//! load–compute(–store) cycle with no shared in-memory state between
//! requests.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ForecastError, ForecastResult};
use crate::forecast::{average_projection, regression_projection};
use crate::rates::{coarse_bucket_stats, fine_bucket_stats, BucketStats, CoarseBucket, FineBucket};
use crate::sample::Sample;
use crate::series::{sanitize, DiscardCounts, SeriesPoint};
use crate::store::SampleStore;

/// Default target the counter is expected to cross.
pub const DEFAULT_TARGET: u64 = 200_000_000;

/// Default sanity ceiling for manually entered counts.
pub const DEFAULT_COUNT_CEILING: u64 = 500_000_000;

/// Default trailing-window size for the mean rate.
pub const DEFAULT_RATE_WINDOW: usize = 5;

/// Tracker configuration.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Counter threshold whose crossing time is forecast.
    pub target: u64,
    /// Ingestion rejects counts above this ceiling as typos.
    pub count_ceiling: u64,
    /// Trailing-window size for the mean rate.
    pub rate_window: usize,
    /// Samples recorded before this point are legacy data and ignored.
    pub history_floor: Option<NaiveDateTime>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET,
            count_ceiling: DEFAULT_COUNT_CEILING,
            rate_window: DEFAULT_RATE_WINDOW,
            history_floor: None,
        }
    }
}

/// Current-state summary, available even when forecasting is not.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrentStatus {
    /// Whether any sample has been stored.
    pub has_data: bool,
    /// The last stored count (0 with no data).
    pub current_count: u64,
    /// Counter gap to the target (signed).
    pub remaining: i64,
    /// Percentage of the target reached, unrounded.
    pub progress_percent: f64,
    /// Timestamp of the last stored sample.
    pub last_update: Option<NaiveDateTime>,
}

/// Everything one forecast pass produces.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForecastReport {
    /// Count at the newest sanitized sample.
    pub current_count: u64,
    /// Counter gap to the target (signed).
    pub remaining: i64,
    /// Mean per-minute rate over the trailing window.
    pub windowed_rate: f64,
    /// Fitted counter growth per minute.
    pub regression_slope: f64,
    /// Fitted counter value at the first sanitized sample.
    pub regression_intercept: f64,
    /// Crossing time extrapolated from the windowed rate.
    pub predicted_time_avg: NaiveDateTime,
    /// Crossing time extrapolated from the fitted line.
    pub predicted_time_linear: NaiveDateTime,
    /// Half-day rate statistics (thin buckets omitted).
    pub bucket_stats: BTreeMap<CoarseBucket, BucketStats>,
    /// Six-hour rate statistics (thin buckets omitted).
    pub fine_bucket_stats: BTreeMap<FineBucket, BucketStats>,
    /// How many raw samples each sanitizer stage discarded.
    pub discarded: DiscardCounts,
    /// Per-sample display rows of the sanitized series.
    pub table: Vec<SeriesPoint>,
}

impl ForecastReport {
    /// Fractional days between `now` and the regression crossing.
    pub fn days_remaining(&self, now: NaiveDateTime) -> f64 {
        (self.predicted_time_linear - now).num_seconds() as f64 / 86_400.0
    }
}

/// Stateless facade over the forecasting core.
pub struct Tracker {
    config: TrackerConfig,
}

impl Tracker {
    /// Create a tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    /// Create a tracker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TrackerConfig::default())
    }

    /// The active configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Record a counter observation timestamped "now" (local wall clock).
    pub fn ingest(&self, store: &dyn SampleStore, count: u64) -> ForecastResult<Sample> {
        self.ingest_at(store, count, Local::now().naive_local())
    }

    /// Record a counter observation at an explicit timestamp.
    ///
    /// Validation is a business rule of the ingestion boundary, not a
    /// storage invariant: the count must be positive, at most the
    /// configured ceiling, and no lower than the last stored count (equal
    /// is a valid no-growth entry).
    pub fn ingest_at(
        &self,
        store: &dyn SampleStore,
        count: u64,
        timestamp: NaiveDateTime,
    ) -> ForecastResult<Sample> {
        if count == 0 || count > self.config.count_ceiling {
            return Err(ForecastError::InvalidCount {
                count,
                ceiling: self.config.count_ceiling,
            });
        }

        if let Some(last) = store.load_or_empty().last() {
            if count < last.cumulative_count {
                return Err(ForecastError::CountRegression {
                    count,
                    previous: last.cumulative_count,
                });
            }
        }

        let sample = Sample::new(timestamp, count);
        store.append(sample.clone())?;
        info!(count, timestamp = %sample.timestamp(), "sample recorded");
        Ok(sample)
    }

    /// Summarize the current counter state without forecasting.
    ///
    /// Never fails: a missing or corrupt store reads as "no data yet".
    pub fn status(&self, store: &dyn SampleStore) -> CurrentStatus {
        let samples = store.load_or_empty();
        match samples.last() {
            None => CurrentStatus {
                has_data: false,
                current_count: 0,
                remaining: self.config.target as i64,
                progress_percent: 0.0,
                last_update: None,
            },
            Some(last) => CurrentStatus {
                has_data: true,
                current_count: last.cumulative_count,
                remaining: self.config.target as i64 - last.cumulative_count as i64,
                progress_percent: last.cumulative_count as f64 / self.config.target as f64
                    * 100.0,
                last_update: Some(last.timestamp()),
            },
        }
    }

    /// Run the full load–sanitize–aggregate–extrapolate cycle.
    ///
    /// `cutoff` is a per-request lower bound on sample timestamps, applied
    /// alongside the configured history floor. Both estimators must
    /// succeed for the report to be produced.
    pub fn forecast(
        &self,
        store: &dyn SampleStore,
        cutoff: Option<NaiveDateTime>,
    ) -> ForecastResult<ForecastReport> {
        let samples = store.load_or_empty();
        let (series, discarded) = sanitize(&samples, cutoff, self.config.history_floor)?;

        let avg = average_projection(&series, self.config.target, self.config.rate_window)?;
        let linear = regression_projection(&series, self.config.target)?;

        debug!(
            current = series.last().sample.cumulative_count,
            windowed_rate = avg.rate_per_minute,
            slope = linear.slope,
            discarded = discarded.total(),
            "forecast computed"
        );

        Ok(ForecastReport {
            current_count: series.last().sample.cumulative_count,
            remaining: avg.remaining,
            windowed_rate: avg.rate_per_minute,
            regression_slope: linear.slope,
            regression_intercept: linear.intercept,
            predicted_time_avg: avg.predicted_time,
            predicted_time_linear: linear.predicted_time,
            bucket_stats: coarse_bucket_stats(&series),
            fine_bucket_stats: fine_bucket_stats(&series),
            discarded,
            table: series.into_points(),
        })
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::with_defaults()
    }
}
