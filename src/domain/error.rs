//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for dcasim.
#[derive(Debug, thiserror::Error)]
pub enum DcaError {
    #[error("invalid cadence '{name}' (expected weekly, monthly, quarterly or biannually)")]
    InvalidCadence { name: String },

    #[error("price series is empty")]
    EmptyPriceSeries,

    #[error("no cadences to compare")]
    EmptyCadenceSet,

    #[error("price dates out of order: {current} does not follow {previous}")]
    NonMonotonicDates {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("non-positive close price on {date}")]
    NonPositivePrice { date: NaiveDate },

    #[error("amount overflow on {date}; contribution is too large")]
    AmountOverflow { date: NaiveDate },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price data error: {reason}")]
    Data { reason: String },

    #[error("no price data for {ticker}")]
    NoData { ticker: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&DcaError> for std::process::ExitCode {
    fn from(err: &DcaError) -> Self {
        let code: u8 = match err {
            DcaError::Io(_) | DcaError::Report { .. } => 1,
            DcaError::ConfigParse { .. }
            | DcaError::ConfigMissing { .. }
            | DcaError::ConfigInvalid { .. } => 2,
            DcaError::Data { .. } => 3,
            DcaError::InvalidCadence { .. } | DcaError::EmptyCadenceSet => 4,
            DcaError::NoData { .. }
            | DcaError::EmptyPriceSeries
            | DcaError::NonMonotonicDates { .. }
            | DcaError::NonPositivePrice { .. }
            | DcaError::AmountOverflow { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
