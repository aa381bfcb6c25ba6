//! Forward-filled weight resolution.
//!
//! A [`WeightRule`] says "from `valid_from` onward, until superseded, this
//! ticker's weight is `weight`". Resolution materialises the rules over every
//! trading day of the price series.
//!
//! A ticker whose first rule has not started yet gets no row for that date.
//! It is implicitly zero-weighted and the remaining weights are not
//! renormalised.

use crate::domain::error::AnalyticsError;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightRule {
    pub valid_from: NaiveDate,
    pub ticker: String,
    pub weight: f64,
}

impl WeightRule {
    pub fn new(valid_from: NaiveDate, ticker: impl Into<String>, weight: f64) -> Self {
        Self {
            valid_from,
            ticker: ticker.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWeight {
    pub date: NaiveDate,
    pub ticker: String,
    pub weight: f64,
}

#[derive(Debug, Default)]
pub struct WeightResolution {
    /// Sorted by (date, ticker).
    pub weights: Vec<ResolvedWeight>,
    /// One [`AnalyticsError::AmbiguousWeightRule`] per duplicated `valid_from`
    /// and one [`AnalyticsError::InvalidWeight`] per dropped non-finite rule.
    pub conflicts: Vec<AnalyticsError>,
}

/// Sort one ticker's rules by `valid_from` and collapse duplicates, keeping
/// the rule that came last in input order.
fn dedup_rules(
    ticker: &str,
    mut rules: Vec<&WeightRule>,
) -> (Vec<(NaiveDate, f64)>, Vec<AnalyticsError>) {
    // Stable: equal valid_from keep their input order.
    rules.sort_by_key(|r| r.valid_from);

    let mut schedule: Vec<(NaiveDate, f64)> = Vec::with_capacity(rules.len());
    let mut conflicts = Vec::new();
    let mut i = 0;
    while i < rules.len() {
        let valid_from = rules[i].valid_from;
        let mut j = i;
        while j + 1 < rules.len() && rules[j + 1].valid_from == valid_from {
            j += 1;
        }
        let kept = rules[j].weight;
        if j > i {
            conflicts.push(AnalyticsError::AmbiguousWeightRule {
                ticker: ticker.to_string(),
                valid_from,
                count: j - i + 1,
                kept,
            });
        }
        schedule.push((valid_from, kept));
        i = j + 1;
    }
    (schedule, conflicts)
}

/// Two-pointer sweep of a deduplicated schedule over ascending dates.
fn sweep(
    ticker: &str,
    schedule: &[(NaiveDate, f64)],
    dates: &[NaiveDate],
) -> Vec<ResolvedWeight> {
    let mut resolved = Vec::new();
    let mut next = 0;
    let mut active: Option<f64> = None;

    for &date in dates {
        while next < schedule.len() && schedule[next].0 <= date {
            active = Some(schedule[next].1);
            next += 1;
        }
        if let Some(weight) = active {
            resolved.push(ResolvedWeight {
                date,
                ticker: ticker.to_string(),
                weight,
            });
        }
    }
    resolved
}

/// Resolve a sparse weight schedule onto `dates`.
///
/// `dates` must be the ascending, distinct trading days of the price series
/// (see [`crate::domain::price::build_timeline`]). A rule with a non-finite
/// weight is dropped, so the ticker's previous rule stays in force.
pub fn resolve_weights(rules: &[WeightRule], dates: &[NaiveDate]) -> WeightResolution {
    let mut rejected = Vec::new();
    let mut by_ticker: BTreeMap<&str, Vec<&WeightRule>> = BTreeMap::new();
    for rule in rules {
        if !rule.weight.is_finite() {
            rejected.push(AnalyticsError::InvalidWeight {
                ticker: rule.ticker.clone(),
                valid_from: rule.valid_from,
                weight: rule.weight,
            });
            continue;
        }
        by_ticker.entry(rule.ticker.as_str()).or_default().push(rule);
    }

    let per_ticker: Vec<(Vec<ResolvedWeight>, Vec<AnalyticsError>)> = by_ticker
        .into_par_iter()
        .map(|(ticker, ticker_rules)| {
            let (schedule, conflicts) = dedup_rules(ticker, ticker_rules);
            (sweep(ticker, &schedule, dates), conflicts)
        })
        .collect();

    let mut resolution = WeightResolution::default();
    for error in rejected {
        warn!("dropping weight rule: {error}");
        resolution.conflicts.push(error);
    }
    for (mut weights, conflicts) in per_ticker {
        resolution.weights.append(&mut weights);
        for conflict in conflicts {
            warn!("{conflict}");
            resolution.conflicts.push(conflict);
        }
    }

    resolution
        .weights
        .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.ticker.cmp(&b.ticker)));
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn days(range: std::ops::RangeInclusive<u32>) -> Vec<NaiveDate> {
        range.map(day).collect()
    }

    fn weights_for(resolution: &WeightResolution, ticker: &str) -> Vec<(NaiveDate, f64)> {
        resolution
            .weights
            .iter()
            .filter(|w| w.ticker == ticker)
            .map(|w| (w.date, w.weight))
            .collect()
    }

    #[test]
    fn single_rule_covers_dates_from_valid_from() {
        let rules = vec![WeightRule::new(day(3), "AAPL", 0.4)];
        let resolution = resolve_weights(&rules, &days(1..=5));

        let resolved = weights_for(&resolution, "AAPL");
        assert_eq!(resolved, vec![(day(3), 0.4), (day(4), 0.4), (day(5), 0.4)]);
        assert!(resolution.conflicts.is_empty());
    }

    #[test]
    fn later_rule_supersedes_earlier() {
        let rules = vec![
            WeightRule::new(day(4), "AAPL", 0.6),
            WeightRule::new(day(1), "AAPL", 0.4),
        ];
        let resolution = resolve_weights(&rules, &days(1..=5));

        let resolved = weights_for(&resolution, "AAPL");
        assert_eq!(
            resolved,
            vec![
                (day(1), 0.4),
                (day(2), 0.4),
                (day(3), 0.4),
                (day(4), 0.6),
                (day(5), 0.6),
            ]
        );
    }

    #[test]
    fn rule_between_trading_days_applies_on_next_day() {
        let dates = vec![day(1), day(4), day(8)];
        let rules = vec![
            WeightRule::new(day(1), "AAPL", 0.5),
            WeightRule::new(day(6), "AAPL", 0.7),
        ];
        let resolution = resolve_weights(&rules, &dates);

        assert_eq!(
            weights_for(&resolution, "AAPL"),
            vec![(day(1), 0.5), (day(4), 0.5), (day(8), 0.7)]
        );
    }

    #[test]
    fn duplicate_valid_from_keeps_last_and_reports_conflict() {
        let rules = vec![
            WeightRule::new(day(1), "AAPL", 0.1),
            WeightRule::new(day(1), "MSFT", 0.5),
            WeightRule::new(day(1), "AAPL", 0.3),
        ];
        let resolution = resolve_weights(&rules, &days(1..=2));

        assert_eq!(
            weights_for(&resolution, "AAPL"),
            vec![(day(1), 0.3), (day(2), 0.3)]
        );
        assert_eq!(resolution.conflicts.len(), 1);
        match &resolution.conflicts[0] {
            AnalyticsError::AmbiguousWeightRule {
                ticker,
                count,
                kept,
                ..
            } => {
                assert_eq!(ticker, "AAPL");
                assert_eq!(*count, 2);
                assert_eq!(*kept, 0.3);
            }
            other => panic!("expected AmbiguousWeightRule, got: {other}"),
        }
    }

    #[test]
    fn non_finite_weight_is_dropped_and_reported() {
        let rules = vec![
            WeightRule::new(day(1), "AAPL", 0.5),
            WeightRule::new(day(3), "AAPL", f64::NAN),
            WeightRule::new(day(4), "MSFT", f64::INFINITY),
        ];
        let resolution = resolve_weights(&rules, &days(1..=5));

        assert!(resolution.weights.iter().all(|w| w.weight.is_finite()));
        assert_eq!(weights_for(&resolution, "AAPL").len(), 5);
        assert!(weights_for(&resolution, "AAPL").iter().all(|(_, w)| *w == 0.5));
        assert!(weights_for(&resolution, "MSFT").is_empty());
        assert_eq!(resolution.conflicts.len(), 2);
        assert!(resolution
            .conflicts
            .iter()
            .all(|e| matches!(e, AnalyticsError::InvalidWeight { .. })));
    }

    #[test]
    fn weights_are_not_renormalised() {
        let rules = vec![
            WeightRule::new(day(1), "AAPL", 0.4),
            WeightRule::new(day(3), "MSFT", 0.6),
        ];
        let resolution = resolve_weights(&rules, &days(1..=3));

        let on_day_two: Vec<&ResolvedWeight> =
            resolution.weights.iter().filter(|w| w.date == day(2)).collect();
        assert_eq!(on_day_two.len(), 1);
        assert_eq!(on_day_two[0].weight, 0.4);
    }

    #[test]
    fn output_sorted_by_date_then_ticker() {
        let rules = vec![
            WeightRule::new(day(1), "MSFT", 0.5),
            WeightRule::new(day(1), "AAPL", 0.5),
        ];
        let resolution = resolve_weights(&rules, &days(1..=2));

        let keys: Vec<(NaiveDate, &str)> = resolution
            .weights
            .iter()
            .map(|w| (w.date, w.ticker.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (day(1), "AAPL"),
                (day(1), "MSFT"),
                (day(2), "AAPL"),
                (day(2), "MSFT"),
            ]
        );
    }

    #[test]
    fn no_rules_or_no_dates_resolve_to_nothing() {
        assert!(resolve_weights(&[], &days(1..=3)).weights.is_empty());
        let rules = vec![WeightRule::new(day(1), "AAPL", 1.0)];
        assert!(resolve_weights(&rules, &[]).weights.is_empty());
    }
}
