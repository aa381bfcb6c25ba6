//! Portfolio daily returns and the compounded growth path.

use crate::domain::returns::ReturnPoint;
use crate::domain::weights::ResolvedWeight;
use chrono::NaiveDate;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioReturnPoint {
    pub date: NaiveDate,
    pub port_ret: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioPathPoint {
    pub date: NaiveDate,
    pub port_cum: f64,
}

fn key_cmp(ret: &ReturnPoint, weight: &ResolvedWeight) -> Ordering {
    ret.date
        .cmp(&weight.date)
        .then_with(|| ret.ticker.as_str().cmp(weight.ticker.as_str()))
}

/// Weighted sum of security returns per date.
///
/// Both inputs must be sorted by (date, ticker). A (date, ticker) pair
/// contributes only when it has both a return and a resolved weight; a date
/// with no contributing pair is omitted from the output.
pub fn aggregate_returns(
    returns: &[ReturnPoint],
    weights: &[ResolvedWeight],
) -> Vec<PortfolioReturnPoint> {
    let mut out: Vec<PortfolioReturnPoint> = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < returns.len() && j < weights.len() {
        match key_cmp(&returns[i], &weights[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let date = returns[i].date;
                let contribution = weights[j].weight * returns[i].ret;
                match out.last_mut() {
                    Some(last) if last.date == date => last.port_ret += contribution,
                    _ => out.push(PortfolioReturnPoint {
                        date,
                        port_ret: contribution,
                    }),
                }
                i += 1;
                j += 1;
            }
        }
    }

    out
}

/// Running product of `(1 + port_ret)` seeded at 1.0.
pub fn compound_path(portfolio_returns: &[PortfolioReturnPoint]) -> Vec<PortfolioPathPoint> {
    let mut cumulative = 1.0_f64;
    portfolio_returns
        .iter()
        .map(|point| {
            cumulative *= 1.0 + point.port_ret;
            PortfolioPathPoint {
                date: point.date,
                port_cum: cumulative,
            }
        })
        .collect()
}
