//! Per-security simple daily returns.
//!
//! RET[i] = CLOSE[i] / CLOSE[i-1] - 1
//! The first observation of each ticker has no return and is dropped.

use crate::domain::error::AnalyticsError;
use crate::domain::price::{group_by_ticker, PricePoint};
use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::warn;

/// Fewest price points that still yield one return.
pub const MIN_PRICE_POINTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    pub ticker: String,
    pub ret: f64,
}

/// A ticker excluded from the return table, with the reason.
#[derive(Debug)]
pub struct SkippedTicker {
    pub ticker: String,
    pub error: AnalyticsError,
}

#[derive(Debug, Default)]
pub struct ReturnTable {
    /// Sorted by (date, ticker).
    pub returns: Vec<ReturnPoint>,
    pub skipped: Vec<SkippedTicker>,
}

/// Simple returns for a single ticker. `prices` need not be sorted.
pub fn compute_returns(
    ticker: &str,
    prices: &[PricePoint],
) -> Result<Vec<ReturnPoint>, AnalyticsError> {
    if prices.len() < MIN_PRICE_POINTS {
        return Err(AnalyticsError::InsufficientHistory {
            ticker: ticker.to_string(),
            points: prices.len(),
            minimum: MIN_PRICE_POINTS,
        });
    }

    let mut sorted: Vec<&PricePoint> = prices.iter().collect();
    sorted.sort_by_key(|p| p.date);

    if let Some(bad) = sorted.iter().find(|p| !p.is_valid_close()) {
        return Err(AnalyticsError::InvalidPrice {
            ticker: ticker.to_string(),
            date: bad.date,
            close: bad.close,
        });
    }

    sorted
        .windows(2)
        .map(|w| {
            let (prev, curr) = (w[0], w[1]);
            if prev.date == curr.date {
                return Err(AnalyticsError::DuplicatePrice {
                    ticker: ticker.to_string(),
                    date: curr.date,
                });
            }
            Ok(ReturnPoint {
                date: curr.date,
                ticker: ticker.to_string(),
                ret: curr.close / prev.close - 1.0,
            })
        })
        .collect()
}

/// Returns for every ticker in a mixed price series.
///
/// Tickers are processed independently on the rayon pool. A ticker that
/// fails is recorded in [`ReturnTable::skipped`] and contributes nothing
/// downstream.
pub fn compute_all_returns(prices: &[PricePoint]) -> ReturnTable {
    let groups: Vec<(String, Vec<PricePoint>)> = group_by_ticker(prices).into_iter().collect();

    let results: Vec<(String, Result<Vec<ReturnPoint>, AnalyticsError>)> = groups
        .into_par_iter()
        .map(|(ticker, series)| {
            let result = compute_returns(&ticker, &series);
            (ticker, result)
        })
        .collect();

    let mut table = ReturnTable::default();
    for (ticker, result) in results {
        match result {
            Ok(mut returns) => table.returns.append(&mut returns),
            Err(error) => {
                warn!(ticker = %ticker, "skipping ticker: {error}");
                table.skipped.push(SkippedTicker { ticker, error });
            }
        }
    }

    table
        .returns
        .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
    table
}
