//! Sample records — timestamped observations of the cumulative counter.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// One manually recorded observation of the cumulative counter.
///
/// Persisted as a flat JSON object. `date` serializes as an ISO calendar
/// date string and `time` as a 24-hour clock string, keeping the store file
/// human-diffable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Calendar date of the observation.
    pub date: NaiveDate,
    /// Wall-clock time of the observation.
    pub time: NaiveTime,
    /// Counter value at the observation. Cumulative: never resets.
    pub cumulative_count: u64,
    /// Opaque structured payload attached at ingestion, unused downstream.
    #[serde(default)]
    pub detail: serde_json::Map<String, serde_json::Value>,
}

impl Sample {
    /// Create a sample from a combined timestamp and a count.
    ///
    /// Sub-second precision is dropped: stored times are whole seconds.
    pub fn new(timestamp: NaiveDateTime, cumulative_count: u64) -> Self {
        let time = timestamp
            .time()
            .with_nanosecond(0)
            .unwrap_or_else(|| timestamp.time());
        Self {
            date: timestamp.date(),
            time,
            cumulative_count,
            detail: serde_json::Map::new(),
        }
    }

    /// The combined `(date, time)` timestamp.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(date: (i32, u32, u32), time: (u32, u32, u32)) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(time.0, time.1, time.2)
            .unwrap()
    }

    #[test]
    fn timestamp_joins_date_and_time() {
        let stamp = ts((2025, 11, 17), (14, 30, 40));
        let s = Sample::new(stamp, 42);
        assert_eq!(s.timestamp(), stamp);
        assert_eq!(s.cumulative_count, 42);
        assert!(s.detail.is_empty());
    }

    #[test]
    fn new_drops_subsecond_precision() {
        let stamp = ts((2025, 11, 17), (14, 30, 40)) + chrono::Duration::nanoseconds(123_456_789);
        let s = Sample::new(stamp, 1);
        assert_eq!(s.time, NaiveTime::from_hms_opt(14, 30, 40).unwrap());
    }

    #[test]
    fn serializes_to_human_diffable_layout() {
        let s = Sample::new(ts((2025, 11, 17), (14, 30, 40)), 150_000_000);
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["date"], "2025-11-17");
        assert_eq!(value["time"], "14:30:40");
        assert_eq!(value["cumulative_count"], 150_000_000u64);
        assert!(value["detail"].as_object().unwrap().is_empty());
    }

    #[test]
    fn deserializes_with_missing_detail() {
        let json = r#"{"date": "2025-11-18", "time": "09:05:00", "cumulative_count": 7}"#;
        let s: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(s.cumulative_count, 7);
        assert!(s.detail.is_empty());
    }

    #[test]
    fn roundtrips_with_detail_payload() {
        let mut s = Sample::new(ts((2025, 11, 18), (9, 0, 0)), 10);
        s.detail
            .insert("note".into(), serde_json::Value::String("manual".into()));

        let json = serde_json::to_string(&s).unwrap();
        let restored: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, s);
    }
}
