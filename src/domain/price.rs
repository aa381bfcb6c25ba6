//! Price observations and the trading-day timeline.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// One closing price for one security on one day.
///
/// `close` is `NaN` when the upstream source had no value; the return
/// calculator rejects such tickers.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub ticker: String,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, ticker: impl Into<String>, close: f64) -> Self {
        Self {
            date,
            ticker: ticker.into(),
            close,
        }
    }

    pub fn is_valid_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Split a mixed price series into per-ticker series, each sorted by date.
pub fn group_by_ticker(prices: &[PricePoint]) -> BTreeMap<String, Vec<PricePoint>> {
    let mut groups: BTreeMap<String, Vec<PricePoint>> = BTreeMap::new();
    for point in prices {
        groups
            .entry(point.ticker.clone())
            .or_default()
            .push(point.clone());
    }
    for series in groups.values_mut() {
        series.sort_by_key(|p| p.date);
    }
    groups
}

/// Distinct dates present anywhere in the price input, ascending.
pub fn build_timeline(prices: &[PricePoint]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = prices.iter().map(|p| p.date).collect();
    unique_dates.into_iter().collect()
}
