//! End-to-end analytics pipeline.
//!
//! prices + weight schedule
//!   -> returns || resolved weights   (per ticker, parallel)
//!   -> portfolio returns -> path     (sequential)
//!   -> drawdown, rolling risk, anomalies
//!   -> summary

use crate::domain::anomaly::{detect_anomalies, AnomalyConfig, AnomalyPoint};
use crate::domain::drawdown::{compute_drawdowns, DrawdownPoint};
use crate::domain::error::AnalyticsError;
use crate::domain::metrics::{SummaryMetrics, DEFAULT_RECENT_ANOMALY_DAYS};
use crate::domain::portfolio::{
    aggregate_returns, compound_path, PortfolioPathPoint, PortfolioReturnPoint,
};
use crate::domain::price::{build_timeline, PricePoint};
use crate::domain::returns::{compute_all_returns, ReturnPoint, SkippedTicker};
use crate::domain::risk::{compute_rolling_risk, RiskConfig, RiskPoint};
use crate::domain::weights::{resolve_weights, ResolvedWeight, WeightRule};
use chrono::NaiveDate;
use tracing::{debug, info, info_span};

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub risk: RiskConfig,
    pub anomaly: AnomalyConfig,
    pub recent_anomaly_days: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            risk: RiskConfig::default(),
            anomaly: AnomalyConfig::default(),
            recent_anomaly_days: DEFAULT_RECENT_ANOMALY_DAYS,
        }
    }
}

/// Every derived table of one run, plus what was dropped along the way.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Input prices, sorted by (date, ticker).
    pub prices: Vec<PricePoint>,
    /// Input weight schedule in source order, including dropped rules.
    pub rules: Vec<WeightRule>,
    pub timeline: Vec<NaiveDate>,
    pub returns: Vec<ReturnPoint>,
    pub skipped: Vec<SkippedTicker>,
    pub weights: Vec<ResolvedWeight>,
    pub weight_conflicts: Vec<AnalyticsError>,
    pub portfolio_returns: Vec<PortfolioReturnPoint>,
    pub path: Vec<PortfolioPathPoint>,
    pub drawdowns: Vec<DrawdownPoint>,
    pub risk: Vec<RiskPoint>,
    pub anomalies: Vec<AnomalyPoint>,
    pub summary: SummaryMetrics,
}

pub fn run_pipeline(
    prices: &[PricePoint],
    rules: &[WeightRule],
    config: &PipelineConfig,
) -> Result<PipelineOutput, AnalyticsError> {
    let _span = info_span!("pipeline", prices = prices.len(), rules = rules.len()).entered();

    if prices.is_empty() {
        return Err(AnalyticsError::EmptySeries {
            what: "no price data".into(),
        });
    }

    let timeline = build_timeline(prices);
    info!(
        "Processing {} dates, {} to {}",
        timeline.len(),
        timeline.first().map(|d| d.to_string()).unwrap_or_default(),
        timeline.last().map(|d| d.to_string()).unwrap_or_default(),
    );

    let (return_table, resolution) = rayon::join(
        || compute_all_returns(prices),
        || resolve_weights(rules, &timeline),
    );
    debug!(
        returns = return_table.returns.len(),
        skipped = return_table.skipped.len(),
        weights = resolution.weights.len(),
        conflicts = resolution.conflicts.len(),
        "per-ticker stages complete"
    );

    let portfolio_returns = aggregate_returns(&return_table.returns, &resolution.weights);
    if portfolio_returns.is_empty() {
        info!("no date has both a resolved weight and a return; summary will be zero");
    }

    let path = compound_path(&portfolio_returns);
    let drawdowns = compute_drawdowns(&path);
    let risk = compute_rolling_risk(&portfolio_returns, &config.risk);
    let anomalies = detect_anomalies(&portfolio_returns, &config.anomaly);

    let summary = SummaryMetrics::compute(
        &portfolio_returns,
        &path,
        &drawdowns,
        &risk,
        &anomalies,
        config.recent_anomaly_days,
    );
    info!(
        portfolio_days = portfolio_returns.len(),
        anomalies = summary.anomalies_60,
        "pipeline complete"
    );

    let mut input_prices = prices.to_vec();
    input_prices.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));

    Ok(PipelineOutput {
        prices: input_prices,
        rules: rules.to_vec(),
        timeline,
        returns: return_table.returns,
        skipped: return_table.skipped,
        weights: resolution.weights,
        weight_conflicts: resolution.conflicts,
        portfolio_returns,
        path,
        drawdowns,
        risk,
        anomalies,
        summary,
    })
}
