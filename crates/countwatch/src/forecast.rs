//! Forecast engine — two independent target-crossing estimators.
//!
//! Both estimators read the same sanitized series. They are deliberately
//! not reconciled: the gap between the short-window average and the
//! full-window trend is itself diagnostic signal for the consumer.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};
use crate::rates::windowed_mean_rate;
use crate::series::Series;

/// Moving-average extrapolation result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AverageProjection {
    /// Mean per-minute rate over the trailing window.
    pub rate_per_minute: f64,
    /// Counter gap between the target and the last sample (signed).
    pub remaining: i64,
    /// Minutes past the last sample until the crossing (signed, fractional).
    pub minutes_needed: f64,
    /// Estimated crossing timestamp.
    pub predicted_time: NaiveDateTime,
}

/// Least-squares linear trend extrapolation result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LinearProjection {
    /// Fitted counter growth per minute.
    pub slope: f64,
    /// Fitted counter value at the first sample's timestamp.
    pub intercept: f64,
    /// Minutes past the first sample at which the fitted line hits the target.
    pub minutes_from_first: f64,
    /// Estimated crossing timestamp.
    pub predicted_time: NaiveDateTime,
}

/// Add a signed fractional number of minutes to a timestamp.
///
/// Rates and slopes are never rounded; only the final timestamp is
/// quantized, to millisecond resolution.
fn add_minutes(ts: NaiveDateTime, minutes: f64) -> NaiveDateTime {
    ts + Duration::milliseconds((minutes * 60_000.0).round() as i64)
}

/// Extrapolate the crossing time from the windowed mean rate.
///
/// `remaining / rate` minutes past the newest sample. A flat or declining
/// window makes the extrapolation undefined (`NonPositiveRate`).
pub fn average_projection(
    series: &Series,
    target: u64,
    window: usize,
) -> ForecastResult<AverageProjection> {
    let rate = windowed_mean_rate(series, window)?;
    if rate <= 0.0 {
        return Err(ForecastError::NonPositiveRate { rate });
    }

    let last = series.last();
    let remaining = target as i64 - last.sample.cumulative_count as i64;
    let minutes_needed = remaining as f64 / rate;

    Ok(AverageProjection {
        rate_per_minute: rate,
        remaining,
        minutes_needed,
        predicted_time: add_minutes(last.timestamp(), minutes_needed),
    })
}

/// Fit `count = slope * minutes_since_first + intercept` by ordinary least
/// squares and solve for the target crossing.
///
/// Closed-form over the centered two-moment statistics of x and y. A flat
/// or declining trend (and the degenerate all-one-instant series, which has
/// no time axis at all) is `NonPositiveSlope`.
pub fn regression_projection(series: &Series, target: u64) -> ForecastResult<LinearProjection> {
    let points = series.points();
    let first_ts = series.first().timestamp();
    let n = points.len() as f64;

    let xs: Vec<f64> = points
        .iter()
        .map(|p| (p.timestamp() - first_ts).num_seconds() as f64 / 60.0)
        .collect();
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = points
        .iter()
        .map(|p| p.sample.cumulative_count as f64)
        .sum::<f64>()
        / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, point) in xs.iter().zip(points) {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (point.sample.cumulative_count as f64 - mean_y);
    }

    if sxx <= 0.0 {
        return Err(ForecastError::NonPositiveSlope { slope: 0.0 });
    }

    let slope = sxy / sxx;
    if slope <= 0.0 {
        return Err(ForecastError::NonPositiveSlope { slope });
    }

    let intercept = mean_y - slope * mean_x;
    let minutes_from_first = (target as f64 - intercept) / slope;

    Ok(LinearProjection {
        slope,
        intercept,
        minutes_from_first,
        predicted_time: add_minutes(first_ts, minutes_from_first),
    })
}
