//! Headline summary metrics.

use super::anomaly::{count_recent, AnomalyPoint};
use super::drawdown::{max_drawdown, DrawdownPoint};
use super::portfolio::{PortfolioPathPoint, PortfolioReturnPoint};
use super::risk::{last_variance, RiskPoint};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_RECENT_ANOMALY_DAYS: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetrics {
    pub total_return: f64,
    pub vol_ann: f64,
    pub sharpe: f64,
    pub max_dd: f64,
    pub vol_30d_ann: f64,
    pub anomalies_60: usize,
}

impl SummaryMetrics {
    /// Reduce the derived series to scalars. Empty series yield zeros.
    ///
    /// The Sharpe numerator annualises the mean daily return by 252 while
    /// the volatility denominator uses sqrt(252).
    pub fn compute(
        portfolio_returns: &[PortfolioReturnPoint],
        path: &[PortfolioPathPoint],
        drawdowns: &[DrawdownPoint],
        risk: &[RiskPoint],
        anomalies: &[AnomalyPoint],
        recent_anomaly_days: usize,
    ) -> Self {
        let total_return = path.last().map(|p| p.port_cum - 1.0).unwrap_or(0.0);

        let (mean, stddev) = mean_stddev(portfolio_returns);
        let vol_ann = stddev * TRADING_DAYS_PER_YEAR.sqrt();

        let sharpe = if vol_ann == 0.0 {
            0.0
        } else {
            (mean * TRADING_DAYS_PER_YEAR) / vol_ann
        };

        let vol_30d_ann = last_variance(risk)
            .map(|v| v.max(0.0).sqrt() * TRADING_DAYS_PER_YEAR.sqrt())
            .unwrap_or(0.0);

        SummaryMetrics {
            total_return,
            vol_ann,
            sharpe,
            max_dd: max_drawdown(drawdowns),
            vol_30d_ann,
            anomalies_60: count_recent(anomalies, recent_anomaly_days),
        }
    }
}

/// Mean and population standard deviation, (0, 0) when empty.
fn mean_stddev(returns: &[PortfolioReturnPoint]) -> (f64, f64) {
    if returns.is_empty() {
        return (0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().map(|r| r.port_ret).sum::<f64>() / n;
    let variance: f64 = returns
        .iter()
        .map(|r| (r.port_ret - mean).powi(2))
        .sum::<f64>()
        / n;

    (mean, variance.sqrt())
}
