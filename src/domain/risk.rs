//! Trailing-window risk metrics for the portfolio return series.
//!
//! VAR(n)[i] = population variance of RET[i-n+1..=i] (divisor n)
//! VOL(n)[i] = sqrt(VAR(n)[i])
//! VaR(n, c)[i] = z(c) * VOL(n)[i] - mean(RET[i-n+1..=i])
//! Warmup: first (n-1) dates carry no value.

use crate::domain::portfolio::PortfolioReturnPoint;
use crate::domain::rolling::RollingWindow;
use chrono::NaiveDate;
use statrs::distribution::{ContinuousCDF, Normal};

pub const DEFAULT_RISK_WINDOW: usize = 30;
pub const DEFAULT_VAR_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub window: usize,
    /// One-sided confidence level for the parametric value-at-risk.
    pub confidence: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_RISK_WINDOW,
            confidence: DEFAULT_VAR_CONFIDENCE,
        }
    }
}

/// Risk values for one date. Every field is `None` until the trailing
/// window holds `window` observations; a computed zero stays `Some(0.0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskPoint {
    pub date: NaiveDate,
    pub var_30d: Option<f64>,
    pub vol_30d: Option<f64>,
    /// One-day loss not exceeded with probability `confidence`, as a
    /// positive fraction of portfolio value.
    pub value_at_risk: Option<f64>,
}

/// Standard normal quantile, `None` outside the open interval (0, 1).
pub fn normal_quantile(confidence: f64) -> Option<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return None;
    }
    Normal::new(0.0, 1.0)
        .ok()
        .map(|dist| dist.inverse_cdf(confidence))
}

pub fn compute_rolling_risk(
    portfolio_returns: &[PortfolioReturnPoint],
    config: &RiskConfig,
) -> Vec<RiskPoint> {
    let z = normal_quantile(config.confidence);
    let mut window = RollingWindow::new(config.window);

    portfolio_returns
        .iter()
        .map(|point| {
            window.push(point.port_ret);
            if !window.is_full() {
                return RiskPoint {
                    date: point.date,
                    var_30d: None,
                    vol_30d: None,
                    value_at_risk: None,
                };
            }

            let variance = window.population_variance();
            let vol = variance.map(f64::sqrt);
            let value_at_risk = match (z, vol, window.mean()) {
                (Some(z), Some(vol), Some(mean)) => Some(z * vol - mean),
                _ => None,
            };
            RiskPoint {
                date: point.date,
                var_30d: variance,
                vol_30d: vol,
                value_at_risk,
            }
        })
        .collect()
}

/// The most recent variance that was actually computed.
pub fn last_variance(risk: &[RiskPoint]) -> Option<f64> {
    risk.iter().rev().find_map(|r| r.var_30d)
}
