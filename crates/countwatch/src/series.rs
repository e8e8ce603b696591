//! Series sanitizer — turns raw stored samples into a clean, annotated
//! working series.
//!
//! Sanitization is pure: sorting, cutoff filtering, and the monotonicity
//! filter never touch the store. A fresh series is derived on every
//! forecast request and discarded afterwards.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForecastError, ForecastResult};
use crate::sample::Sample;

/// Minimum usable samples after every sanitizer stage.
pub const MIN_SAMPLES: usize = 2;

/// The sanitizer stage at which a series ran out of samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanitizeStage {
    /// Raw samples as loaded from the store.
    Load,
    /// After dropping samples before the cutoff / history floor.
    Cutoff,
    /// After dropping samples whose counter regressed.
    Monotonic,
}

impl fmt::Display for SanitizeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Cutoff => "cutoff",
            Self::Monotonic => "monotonic",
        })
    }
}

/// One sample annotated with growth relative to its predecessor.
///
/// All three annotations are undefined for the first point. The rate is
/// also undefined when no time elapsed: duplicate-timestamp samples are
/// kept but never contribute to rate means.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(flatten)]
    pub sample: Sample,
    /// Count growth since the previous point.
    pub delta: Option<i64>,
    /// Minutes elapsed since the previous point.
    pub elapsed_minutes: Option<f64>,
    /// `delta / elapsed_minutes`, defined only when time elapsed.
    pub rate_per_minute: Option<f64>,
}

impl SeriesPoint {
    /// The combined `(date, time)` timestamp of the underlying sample.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.sample.timestamp()
    }
}

/// How many raw samples each sanitizer stage discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardCounts {
    /// Dropped for falling before the cutoff or history floor.
    pub before_cutoff: usize,
    /// Dropped for a negative count delta (a bad manual entry).
    pub non_monotonic: usize,
}

impl DiscardCounts {
    /// Total discarded across all stages.
    pub fn total(&self) -> usize {
        self.before_cutoff + self.non_monotonic
    }
}

/// A sanitized, chronologically ordered, annotated series.
///
/// Only [`sanitize`] constructs one, so a `Series` always holds at least
/// [`MIN_SAMPLES`] points.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Series {
    points: Vec<SeriesPoint>,
}

impl Series {
    pub(crate) fn new(points: Vec<SeriesPoint>) -> Self {
        debug_assert!(points.len() >= MIN_SAMPLES);
        Self { points }
    }

    /// All points, oldest first.
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The oldest point.
    pub fn first(&self) -> &SeriesPoint {
        &self.points[0]
    }

    /// The newest point.
    pub fn last(&self) -> &SeriesPoint {
        &self.points[self.points.len() - 1]
    }

    /// Consume the series, yielding its points.
    pub fn into_points(self) -> Vec<SeriesPoint> {
        self.points
    }
}

/// Sanitize raw samples into a working series.
///
/// Stages, in order:
/// 1. stable sort by `(date, time)` ascending;
/// 2. drop samples strictly before `cutoff` or `floor` (a sample exactly at
///    the bound is kept);
/// 3. drop samples whose count fell below their predecessor in the sorted,
///    cutoff-filtered sequence — the first sample has no delta and is
///    always kept;
/// 4. annotate the survivors with delta, elapsed minutes, and per-minute
///    rate, recomputed over the surviving sequence.
///
/// Fails with `InsufficientData` naming the stage that left fewer than
/// [`MIN_SAMPLES`] samples. Returns the per-stage discard counts alongside
/// the series for diagnostics.
pub fn sanitize(
    samples: &[Sample],
    cutoff: Option<NaiveDateTime>,
    floor: Option<NaiveDateTime>,
) -> ForecastResult<(Series, DiscardCounts)> {
    if samples.len() < MIN_SAMPLES {
        return Err(ForecastError::InsufficientData {
            stage: SanitizeStage::Load,
            have: samples.len(),
        });
    }

    let mut sorted: Vec<Sample> = samples.to_vec();
    sorted.sort_by_key(|s| (s.date, s.time));

    let mut discarded = DiscardCounts::default();

    let kept: Vec<Sample> = sorted
        .into_iter()
        .filter(|s| {
            let ts = s.timestamp();
            let stale = cutoff.is_some_and(|c| ts < c) || floor.is_some_and(|f| ts < f);
            if stale {
                discarded.before_cutoff += 1;
            }
            !stale
        })
        .collect();

    if kept.len() < MIN_SAMPLES {
        return Err(ForecastError::InsufficientData {
            stage: SanitizeStage::Cutoff,
            have: kept.len(),
        });
    }

    // The monotonicity check compares each sample against its immediate
    // predecessor in the cutoff-filtered order, not against the last
    // survivor: one bad entry drops exactly one sample.
    let mut survivors: Vec<Sample> = Vec::with_capacity(kept.len());
    for (i, s) in kept.iter().enumerate() {
        if i > 0 && s.cumulative_count < kept[i - 1].cumulative_count {
            discarded.non_monotonic += 1;
            continue;
        }
        survivors.push(s.clone());
    }

    if survivors.len() < MIN_SAMPLES {
        return Err(ForecastError::InsufficientData {
            stage: SanitizeStage::Monotonic,
            have: survivors.len(),
        });
    }

    if discarded.total() > 0 {
        debug!(
            before_cutoff = discarded.before_cutoff,
            non_monotonic = discarded.non_monotonic,
            "sanitizer discarded samples"
        );
    }

    let mut points = Vec::with_capacity(survivors.len());
    for (i, s) in survivors.iter().enumerate() {
        let (delta, elapsed_minutes, rate_per_minute) = if i == 0 {
            (None, None, None)
        } else {
            let prev = &survivors[i - 1];
            let delta = s.cumulative_count as i64 - prev.cumulative_count as i64;
            let elapsed = (s.timestamp() - prev.timestamp()).num_seconds() as f64 / 60.0;
            let rate = if elapsed > 0.0 {
                Some(delta as f64 / elapsed)
            } else {
                None
            };
            (Some(delta), Some(elapsed), rate)
        };
        points.push(SeriesPoint {
            sample: s.clone(),
            delta,
            elapsed_minutes,
            rate_per_minute,
        });
    }

    Ok((Series::new(points), discarded))
}
