//! Configuration validation.
//!
//! Validates all config fields before an analytics run.

use crate::domain::anomaly::DEFAULT_ANOMALY_WINDOW;
use crate::domain::error::AnalyticsError;
use crate::domain::metrics::DEFAULT_RECENT_ANOMALY_DAYS;
use crate::domain::risk::{DEFAULT_RISK_WINDOW, DEFAULT_VAR_CONFIDENCE};
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: [&str; 2] = ["csv", "sqlite"];
pub const DEFAULT_POOL_SIZE: i64 = 4;

pub fn validate_analytics_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    validate_data_source(config)?;
    validate_sqlite(config)?;
    validate_risk(config)?;
    validate_anomaly(config)?;
    validate_summary(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> AnalyticsError {
    AnalyticsError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    if !DATA_SOURCES.contains(&source.trim().to_lowercase().as_str()) {
        return Err(invalid(
            "data",
            "source",
            &format!("unknown source '{}', expected csv or sqlite", source.trim()),
        ));
    }
    Ok(())
}

/// Shared with the SQLite adapter so both reject the same values.
pub fn pool_size(config: &dyn ConfigPort) -> Result<u32, AnalyticsError> {
    u32::try_from(config.get_int("sqlite", "pool_size", DEFAULT_POOL_SIZE))
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| {
            invalid(
                "sqlite",
                "pool_size",
                "pool_size must be between 1 and 4294967295",
            )
        })
}

fn validate_sqlite(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    pool_size(config).map(|_| ())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let window = config.get_int("risk", "window", DEFAULT_RISK_WINDOW as i64);
    if window < 1 {
        return Err(invalid("risk", "window", "window must be at least 1"));
    }
    let confidence = config.get_double("risk", "confidence", DEFAULT_VAR_CONFIDENCE);
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(invalid(
            "risk",
            "confidence",
            "confidence must be between 0 and 1 (exclusive)",
        ));
    }
    Ok(())
}

fn validate_anomaly(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let window = config.get_int("anomaly", "window", DEFAULT_ANOMALY_WINDOW as i64);
    if window < 1 {
        return Err(invalid("anomaly", "window", "window must be at least 1"));
    }
    let min_history = config.get_int("anomaly", "min_history", window);
    if min_history < 1 || min_history > window {
        return Err(invalid(
            "anomaly",
            "min_history",
            "min_history must be between 1 and the anomaly window",
        ));
    }
    let threshold = config.get_double("anomaly", "threshold", 3.0);
    if !(threshold.is_finite() && threshold > 0.0) {
        return Err(invalid("anomaly", "threshold", "threshold must be positive"));
    }
    Ok(())
}

fn validate_summary(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let days = config.get_int(
        "summary",
        "recent_anomaly_days",
        DEFAULT_RECENT_ANOMALY_DAYS as i64,
    );
    if days < 1 {
        return Err(invalid(
            "summary",
            "recent_anomaly_days",
            "recent_anomaly_days must be at least 1",
        ));
    }
    Ok(())
}
