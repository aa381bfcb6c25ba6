//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for equitrace.
///
/// The first group of variants are data-content conditions raised by the
/// analytics stages. Only [`AnalyticsError::EmptySeries`] aborts a run; the
/// per-ticker variants are collected and logged while the rest of the
/// pipeline proceeds.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("invalid price for {ticker} on {date}: close {close} must be a positive number")]
    InvalidPrice {
        ticker: String,
        date: NaiveDate,
        close: f64,
    },

    #[error("duplicate price for {ticker} on {date}")]
    DuplicatePrice { ticker: String, date: NaiveDate },

    #[error("insufficient history for {ticker}: have {points} price points, need {minimum}")]
    InsufficientHistory {
        ticker: String,
        points: usize,
        minimum: usize,
    },

    #[error(
        "ambiguous weight rules for {ticker}: {count} rules valid from {valid_from}, keeping weight {kept}"
    )]
    AmbiguousWeightRule {
        ticker: String,
        valid_from: NaiveDate,
        count: usize,
        kept: f64,
    },

    #[error("invalid weight for {ticker} from {valid_from}: {weight} is not a finite number")]
    InvalidWeight {
        ticker: String,
        valid_from: NaiveDate,
        weight: f64,
    },

    #[error("empty series: {what}")]
    EmptySeries { what: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("data query error: {reason}")]
    DataQuery { reason: String },

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

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalyticsError {
    /// True for conditions that drop a single ticker or rule instead of
    /// aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalyticsError::InvalidPrice { .. }
                | AnalyticsError::DuplicatePrice { .. }
                | AnalyticsError::InsufficientHistory { .. }
                | AnalyticsError::AmbiguousWeightRule { .. }
                | AnalyticsError::InvalidWeight { .. }
        )
    }
}

impl From<&AnalyticsError> for std::process::ExitCode {
    fn from(err: &AnalyticsError) -> Self {
        let code: u8 = match err {
            AnalyticsError::Io(_) | AnalyticsError::Report { .. } => 1,
            AnalyticsError::ConfigParse { .. }
            | AnalyticsError::ConfigMissing { .. }
            | AnalyticsError::ConfigInvalid { .. } => 2,
            AnalyticsError::DataSource { .. } | AnalyticsError::DataQuery { .. } => 3,
            AnalyticsError::InvalidPrice { .. }
            | AnalyticsError::DuplicatePrice { .. }
            | AnalyticsError::InsufficientHistory { .. }
            | AnalyticsError::AmbiguousWeightRule { .. }
            | AnalyticsError::InvalidWeight { .. }
            | AnalyticsError::EmptySeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
