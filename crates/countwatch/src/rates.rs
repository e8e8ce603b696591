//! Rate aggregation — windowed mean growth rate and time-of-day statistics.

use std::collections::BTreeMap;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};
use crate::series::Series;

/// Mean per-minute rate over the trailing window.
///
/// Looks at the last `min(window, len)` points and averages their defined
/// rates. Points without a defined rate (the first point of the series,
/// duplicate timestamps) stay in the window but contribute nothing; if the
/// whole window is undefined the result is `NoValidRate`.
pub fn windowed_mean_rate(series: &Series, window: usize) -> ForecastResult<f64> {
    let points = series.points();
    let tail = &points[points.len().saturating_sub(window.max(1))..];

    let rates: Vec<f64> = tail.iter().filter_map(|p| p.rate_per_minute).collect();
    if rates.is_empty() {
        return Err(ForecastError::NoValidRate);
    }
    Ok(rates.iter().sum::<f64>() / rates.len() as f64)
}

/// Coarse half-day bucket, keyed by the hour of the sample timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoarseBucket {
    /// Hours `[0, 12)`.
    BeforeNoon,
    /// Hours `[12, 24)`.
    FromNoon,
}

impl CoarseBucket {
    /// Classify an hour of day.
    pub fn of_hour(hour: u32) -> Self {
        if hour < 12 {
            Self::BeforeNoon
        } else {
            Self::FromNoon
        }
    }
}

/// Fine six-hour bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FineBucket {
    /// Hours `[0, 6)`.
    Night,
    /// Hours `[6, 12)`.
    Morning,
    /// Hours `[12, 18)`.
    Afternoon,
    /// Hours `[18, 24)`.
    Evening,
}

impl FineBucket {
    /// Classify an hour of day.
    pub fn of_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::Night,
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }
}

/// Summary of the defined rates inside one time-of-day bucket.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    /// Arithmetic mean of the defined rates.
    pub mean: f64,
    /// Number of defined rates in the bucket.
    pub count: usize,
    /// Smallest defined rate.
    pub min: f64,
    /// Largest defined rate.
    pub max: f64,
}

fn bucket_stats<B>(series: &Series, classify: impl Fn(u32) -> B) -> BTreeMap<B, BucketStats>
where
    B: Ord + Copy,
{
    let mut members: BTreeMap<B, (usize, Vec<f64>)> = BTreeMap::new();
    for point in series.points() {
        let bucket = classify(point.timestamp().hour());
        let entry = members.entry(bucket).or_default();
        entry.0 += 1;
        if let Some(rate) = point.rate_per_minute {
            entry.1.push(rate);
        }
    }

    members
        .into_iter()
        .filter_map(|(bucket, (samples, rates))| {
            // Buckets need two member samples and at least one defined rate;
            // anything thinner is omitted rather than zero-filled.
            if samples < 2 || rates.is_empty() {
                return None;
            }
            let mean = rates.iter().sum::<f64>() / rates.len() as f64;
            let min = rates.iter().copied().fold(f64::INFINITY, f64::min);
            let max = rates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Some((
                bucket,
                BucketStats {
                    mean,
                    count: rates.len(),
                    min,
                    max,
                },
            ))
        })
        .collect()
}

/// Per-half-day statistics over the defined rates.
pub fn coarse_bucket_stats(series: &Series) -> BTreeMap<CoarseBucket, BucketStats> {
    bucket_stats(series, CoarseBucket::of_hour)
}

/// Per-six-hour statistics over the defined rates.
pub fn fine_bucket_stats(series: &Series) -> BTreeMap<FineBucket, BucketStats> {
    bucket_stats(series, FineBucket::of_hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Sample;
    use crate::series::sanitize;
    use chrono::NaiveDate;

    fn at_hour(hour: u32, minute: u32, count: u64) -> Sample {
        let ts = NaiveDate::from_ymd_opt(2025, 11, 20)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        Sample::new(ts, count)
    }

    fn series_of(samples: Vec<Sample>) -> Series {
        sanitize(&samples, None, None).unwrap().0
    }

    #[test]
    fn windowed_mean_uses_trailing_window() {
        // Rates per 10-minute step: 1, 2, 3, 4, 5, 6 per minute.
        let samples = vec![
            at_hour(9, 0, 100),
            at_hour(9, 10, 110),
            at_hour(9, 20, 130),
            at_hour(9, 30, 160),
            at_hour(9, 40, 200),
            at_hour(9, 50, 250),
            at_hour(10, 0, 310),
        ];
        let series = series_of(samples);

        // Last 5 points carry rates 2..=6.
        let mean = windowed_mean_rate(&series, 5).unwrap();
        assert!((mean - 4.0).abs() < 1e-12);

        // A window larger than the series uses every defined rate (1..=6).
        let mean = windowed_mean_rate(&series, 50).unwrap();
        assert!((mean - 3.5).abs() < 1e-12);
    }

    #[test]
    fn windowed_mean_skips_undefined_rates() {
        // The first point has no rate; with window 2 over a 2-point series
        // only the second point's rate counts.
        let series = series_of(vec![at_hour(9, 0, 100), at_hour(9, 10, 150)]);
        let mean = windowed_mean_rate(&series, 2).unwrap();
        assert!((mean - 5.0).abs() < 1e-12);
    }

    #[test]
    fn no_valid_rate_when_window_is_all_undefined() {
        // Two samples at the same instant: both rates undefined.
        let series = series_of(vec![at_hour(9, 0, 100), at_hour(9, 0, 100)]);
        let err = windowed_mean_rate(&series, 5).unwrap_err();
        assert!(matches!(err, ForecastError::NoValidRate));
    }

    #[test]
    fn hour_classification_boundaries() {
        assert_eq!(CoarseBucket::of_hour(0), CoarseBucket::BeforeNoon);
        assert_eq!(CoarseBucket::of_hour(11), CoarseBucket::BeforeNoon);
        assert_eq!(CoarseBucket::of_hour(12), CoarseBucket::FromNoon);
        assert_eq!(CoarseBucket::of_hour(23), CoarseBucket::FromNoon);

        assert_eq!(FineBucket::of_hour(0), FineBucket::Night);
        assert_eq!(FineBucket::of_hour(5), FineBucket::Night);
        assert_eq!(FineBucket::of_hour(6), FineBucket::Morning);
        assert_eq!(FineBucket::of_hour(11), FineBucket::Morning);
        assert_eq!(FineBucket::of_hour(12), FineBucket::Afternoon);
        assert_eq!(FineBucket::of_hour(17), FineBucket::Afternoon);
        assert_eq!(FineBucket::of_hour(18), FineBucket::Evening);
        assert_eq!(FineBucket::of_hour(23), FineBucket::Evening);
    }

    #[test]
    fn bucket_stats_over_defined_rates() {
        // Three morning samples (two defined rates: 5 and 6), one afternoon
        // sample (rate 2 — but the bucket has only one member sample).
        let series = series_of(vec![
            at_hour(9, 0, 100),
            at_hour(9, 10, 150),
            at_hour(9, 20, 210),
            at_hour(13, 0, 610),
        ]);

        let fine = fine_bucket_stats(&series);
        let morning = &fine[&FineBucket::Morning];
        assert_eq!(morning.count, 2);
        assert!((morning.mean - 5.5).abs() < 1e-12);
        assert!((morning.min - 5.0).abs() < 1e-12);
        assert!((morning.max - 6.0).abs() < 1e-12);

        // A fine bucket with a single member sample must be absent.
        assert!(!fine.contains_key(&FineBucket::Afternoon));

        let coarse = coarse_bucket_stats(&series);
        assert!(coarse.contains_key(&CoarseBucket::BeforeNoon));
        assert!(!coarse.contains_key(&CoarseBucket::FromNoon));
    }

    #[test]
    fn bucket_without_defined_rate_omitted() {
        // Two samples at one instant: the night bucket has two members but
        // zero defined rates.
        let series = series_of(vec![at_hour(3, 0, 100), at_hour(3, 0, 100)]);
        assert!(fine_bucket_stats(&series).is_empty());
        assert!(coarse_bucket_stats(&series).is_empty());
    }

    #[test]
    fn bucket_keys_serialize_as_strings() {
        let series = series_of(vec![
            at_hour(9, 0, 100),
            at_hour(9, 10, 150),
            at_hour(9, 20, 210),
        ]);
        let value = serde_json::to_value(coarse_bucket_stats(&series)).unwrap();
        assert!(value.get("before-noon").is_some());

        let value = serde_json::to_value(fine_bucket_stats(&series)).unwrap();
        assert!(value.get("morning").is_some());
    }
}
