//! Data access port trait.
//!
//! The upstream feed supplies a price series and a weight schedule; the
//! analytics core never talks to storage directly.

use crate::domain::error::AnalyticsError;
use crate::domain::price::PricePoint;
use crate::domain::weights::WeightRule;
use std::collections::BTreeSet;

pub trait DataPort {
    fn fetch_prices(&self) -> Result<Vec<PricePoint>, AnalyticsError>;

    fn fetch_weight_schedule(&self) -> Result<Vec<WeightRule>, AnalyticsError>;

    /// Distinct tickers present in the price series, sorted.
    fn list_tickers(&self) -> Result<Vec<String>, AnalyticsError> {
        let tickers: BTreeSet<String> = self
            .fetch_prices()?
            .into_iter()
            .map(|p| p.ticker)
            .collect();
        Ok(tickers.into_iter().collect())
    }
}
