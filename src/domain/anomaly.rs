//! Trailing z-score anomaly flags for the portfolio return series.
//!
//! For each date D the baseline is up to `window` returns strictly before D.
//! D is flagged when the baseline holds at least `min_history` returns and
//! |RET[D] - mean| > k * stddev (population). Dates without enough history
//! are reported as not anomalous rather than omitted.

use crate::domain::portfolio::PortfolioReturnPoint;
use crate::domain::rolling::RollingWindow;
use chrono::NaiveDate;

pub const DEFAULT_ANOMALY_WINDOW: usize = 30;
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 3.0;

/// Deviations at or below this are floating-point noise, never anomalies.
pub const DEVIATION_NOISE_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyConfig {
    pub window: usize,
    pub min_history: usize,
    /// Multiple `k` of the trailing standard deviation.
    pub threshold: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_ANOMALY_WINDOW,
            min_history: DEFAULT_ANOMALY_WINDOW,
            threshold: DEFAULT_ANOMALY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyPoint {
    pub date: NaiveDate,
    pub port_ret: f64,
    /// `None` without enough history or when the baseline has zero spread.
    pub z_score: Option<f64>,
    pub is_anomaly: bool,
}

pub fn detect_anomalies(
    portfolio_returns: &[PortfolioReturnPoint],
    config: &AnomalyConfig,
) -> Vec<AnomalyPoint> {
    let min_history = config.min_history.max(1);
    let mut baseline = RollingWindow::new(config.window);

    portfolio_returns
        .iter()
        .map(|point| {
            let mut z_score = None;
            let mut is_anomaly = false;

            if baseline.len() >= min_history {
                if let (Some(mean), Some(stddev)) = (baseline.mean(), baseline.population_stddev())
                {
                    let deviation = point.port_ret - mean;
                    if stddev > 0.0 {
                        z_score = Some(deviation / stddev);
                    }
                    is_anomaly = deviation.abs() > DEVIATION_NOISE_FLOOR
                        && deviation.abs() > config.threshold * stddev;
                }
            }

            baseline.push(point.port_ret);
            AnomalyPoint {
                date: point.date,
                port_ret: point.port_ret,
                z_score,
                is_anomaly,
            }
        })
        .collect()
}

/// Number of flagged days among the last `lookback` points.
pub fn count_recent(anomalies: &[AnomalyPoint], lookback: usize) -> usize {
    let start = anomalies.len().saturating_sub(lookback);
    anomalies[start..].iter().filter(|a| a.is_anomaly).count()
}
