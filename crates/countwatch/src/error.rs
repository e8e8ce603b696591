use thiserror::Error;

use crate::series::SanitizeStage;

/// Errors from the forecasting core.
///
/// Every entry point returns these as structured results; nothing here is
/// ever raised as an unrecoverable fault. The Display strings double as the
/// human-readable reasons handed to callers.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("insufficient data after the {stage} stage: {have} sample(s), need at least 2")]
    InsufficientData { stage: SanitizeStage, have: usize },

    #[error("no sample in the rate window has a defined per-minute rate")]
    NoValidRate,

    #[error("windowed growth rate {rate} is not positive; cannot extrapolate to the target")]
    NonPositiveRate { rate: f64 },

    #[error("regression slope {slope} is not positive; cannot extrapolate to the target")]
    NonPositiveSlope { slope: f64 },

    #[error("invalid count {count}: must be positive and at most {ceiling}")]
    InvalidCount { count: u64, ceiling: u64 },

    #[error("count {count} is below the last recorded count {previous}")]
    CountRegression { count: u64, previous: u64 },

    #[error("sample store unreadable: {0}")]
    CorruptStore(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<std::io::Error> for ForecastError {
    fn from(e: std::io::Error) -> Self {
        ForecastError::Persistence(e.to_string())
    }
}

/// Convenience type alias for forecasting results.
pub type ForecastResult<T> = Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ForecastError::InsufficientData {
            stage: SanitizeStage::Cutoff,
            have: 1,
        };
        assert!(e.to_string().contains("cutoff"));
        assert!(e.to_string().contains('1'));

        let e = ForecastError::NonPositiveRate { rate: -0.5 };
        assert!(e.to_string().contains("-0.5"));

        let e = ForecastError::InvalidCount {
            count: 600_000_000,
            ceiling: 500_000_000,
        };
        assert!(e.to_string().contains("600000000"));
        assert!(e.to_string().contains("500000000"));

        let e = ForecastError::CountRegression {
            count: 90,
            previous: 100,
        };
        assert!(e.to_string().contains("90"));
        assert!(e.to_string().contains("100"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked file");
        let err: ForecastError = io_err.into();
        assert!(err.to_string().contains("locked file"));
    }

    #[test]
    fn result_type_works() {
        let ok: ForecastResult<u32> = Ok(7);
        assert_eq!(ok.unwrap(), 7);

        let err: ForecastResult<u32> = Err(ForecastError::NoValidRate);
        assert!(err.is_err());
    }
}
