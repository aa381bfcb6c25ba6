//! CSV file data adapter.
//!
//! Reads long-format tables with a header row. Columns are located by name,
//! so `date,ticker,close` and `date,close,ticker` are both accepted.

use crate::domain::error::AnalyticsError;
use crate::domain::price::PricePoint;
use crate::domain::weights::WeightRule;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvAdapter {
    prices_path: PathBuf,
    weights_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(prices_path: PathBuf, weights_path: PathBuf) -> Self {
        Self {
            prices_path,
            weights_path,
        }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AnalyticsError> {
        Self::from_config_with_paths(config, None, None)
    }

    /// Like [`CsvAdapter::from_config`], but an explicit path replaces the
    /// configured one and the `[data]` key may then be absent.
    pub fn from_config_with_paths(
        config: &dyn ConfigPort,
        prices: Option<PathBuf>,
        weights: Option<PathBuf>,
    ) -> Result<Self, AnalyticsError> {
        let resolve = |key: &str, explicit: Option<PathBuf>| match explicit {
            Some(path) => Ok(path),
            None => config
                .get_path("data", key)
                .map(PathBuf::from)
                .ok_or_else(|| AnalyticsError::ConfigMissing {
                    section: "data".into(),
                    key: key.into(),
                }),
        };
        Ok(Self::new(
            resolve("prices", prices)?,
            resolve("weights", weights)?,
        ))
    }
}

/// Parse `YYYY-MM-DD`, ignoring a trailing time component.
pub fn parse_date(value: &str) -> Result<NaiveDate, AnalyticsError> {
    let trimmed = value.trim();
    let date_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| AnalyticsError::DataSource {
        reason: format!("invalid date '{}': {}", trimmed, e),
    })
}

fn read_table(path: &Path) -> Result<csv::Reader<fs::File>, AnalyticsError> {
    csv::Reader::from_path(path).map_err(|e| AnalyticsError::DataSource {
        reason: format!("failed to open {}: {}", path.display(), e),
    })
}

fn column_index(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, AnalyticsError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| AnalyticsError::DataSource {
            reason: format!("missing {} column in {}", name, path.display()),
        })
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<&'r str, AnalyticsError> {
    record.get(index).ok_or_else(|| AnalyticsError::DataSource {
        reason: format!("missing {} value", name),
    })
}

impl DataPort for CsvAdapter {
    fn fetch_prices(&self) -> Result<Vec<PricePoint>, AnalyticsError> {
        let path = self.prices_path.as_path();
        let mut rdr = read_table(path)?;
        let headers = rdr
            .headers()
            .map_err(|e| AnalyticsError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let date_col = column_index(&headers, "date", path)?;
        let ticker_col = column_index(&headers, "ticker", path)?;
        let close_col = column_index(&headers, "close", path)?;

        let mut prices = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| AnalyticsError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date = parse_date(field(&record, date_col, "date")?)?;
            let ticker = field(&record, ticker_col, "ticker")?.trim().to_string();

            let close_str = field(&record, close_col, "close")?.trim();
            // A blank close is a missing observation, rejected per ticker later.
            let close: f64 = if close_str.is_empty() {
                f64::NAN
            } else {
                close_str.parse().map_err(|e| AnalyticsError::DataSource {
                    reason: format!("invalid close value '{}': {}", close_str, e),
                })?
            };

            prices.push(PricePoint {
                date,
                ticker,
                close,
            });
        }

        debug!(rows = prices.len(), path = %path.display(), "loaded prices");
        Ok(prices)
    }

    fn fetch_weight_schedule(&self) -> Result<Vec<WeightRule>, AnalyticsError> {
        let path = self.weights_path.as_path();
        let mut rdr = read_table(path)?;
        let headers = rdr
            .headers()
            .map_err(|e| AnalyticsError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let from_col = column_index(&headers, "valid_from", path)?;
        let ticker_col = column_index(&headers, "ticker", path)?;
        let weight_col = column_index(&headers, "weight", path)?;

        let mut rules = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| AnalyticsError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let valid_from = parse_date(field(&record, from_col, "valid_from")?)?;
            let ticker = field(&record, ticker_col, "ticker")?.trim().to_string();
            let weight_str = field(&record, weight_col, "weight")?.trim();
            let weight: f64 = weight_str.parse().map_err(|e| AnalyticsError::DataSource {
                reason: format!("invalid weight value '{}': {}", weight_str, e),
            })?;
            // `f64::from_str` accepts "NaN" and "inf".
            if !weight.is_finite() {
                return Err(AnalyticsError::InvalidWeight {
                    ticker,
                    valid_from,
                    weight,
                });
            }

            rules.push(WeightRule {
                valid_from,
                ticker,
                weight,
            });
        }

        debug!(rows = rules.len(), path = %path.display(), "loaded weight schedule");
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data(prices: &str, weights: &str) -> (TempDir, CsvAdapter) {
        let dir = TempDir::new().unwrap();
        let prices_path = dir.path().join("sample_prices.csv");
        let weights_path = dir.path().join("portfolio_weights.csv");
        fs::write(&prices_path, prices).unwrap();
        fs::write(&weights_path, weights).unwrap();
        (dir, CsvAdapter::new(prices_path, weights_path))
    }

    const WEIGHTS: &str = "valid_from,ticker,weight\n\
        2024-08-12,AAPL,0.4\n\
        2024-08-12,MSFT,0.35\n\
        2024-08-12,GOOGL,0.25\n";

    #[test]
    fn fetch_prices_with_close_before_ticker() {
        let (_dir, adapter) = setup_test_data(
            "date,close,ticker\n\
             2024-08-12,217.53,AAPL\n\
             2024-08-12,406.02,MSFT\n\
             2024-08-13 00:00:00,221.27,AAPL\n",
            WEIGHTS,
        );

        let prices = adapter.fetch_prices().unwrap();

        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].ticker, "AAPL");
        assert_eq!(prices[0].date, NaiveDate::from_ymd_opt(2024, 8, 12).unwrap());
        assert_eq!(prices[0].close, 217.53);
        assert_eq!(prices[2].date, NaiveDate::from_ymd_opt(2024, 8, 13).unwrap());
    }

    #[test]
    fn blank_close_becomes_nan() {
        let (_dir, adapter) = setup_test_data(
            "date,ticker,close\n2024-08-12,AAPL,\n2024-08-13,AAPL,1.0\n",
            WEIGHTS,
        );
        let prices = adapter.fetch_prices().unwrap();
        assert!(prices[0].close.is_nan());
        assert!(!prices[0].is_valid_close());
    }

    #[test]
    fn non_numeric_close_is_a_source_error() {
        let (_dir, adapter) =
            setup_test_data("date,ticker,close\n2024-08-12,AAPL,abc\n", WEIGHTS);
        let err = adapter.fetch_prices().unwrap_err();
        assert!(matches!(err, AnalyticsError::DataSource { .. }));
    }

    #[test]
    fn missing_column_is_reported() {
        let (_dir, adapter) = setup_test_data("date,close\n2024-08-12,1.0\n", WEIGHTS);
        let err = adapter.fetch_prices().unwrap_err();
        match err {
            AnalyticsError::DataSource { reason } => assert!(reason.contains("ticker")),
            other => panic!("expected DataSource, got: {other}"),
        }
    }

    #[test]
    fn fetch_weight_schedule_reads_rules() {
        let (_dir, adapter) = setup_test_data("date,ticker,close\n", WEIGHTS);
        let rules = adapter.fetch_weight_schedule().unwrap();

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1].ticker, "MSFT");
        assert_eq!(rules[1].weight, 0.35);
        assert_eq!(
            rules[1].valid_from,
            NaiveDate::from_ymd_opt(2024, 8, 12).unwrap()
        );
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        for value in ["NaN", "inf", "-infinity"] {
            let (_dir, adapter) = setup_test_data(
                "date,ticker,close\n",
                &format!("valid_from,ticker,weight\n2024-08-12,AAPL,0.4\n2024-08-13,AAPL,{value}\n"),
            );
            let err = adapter.fetch_weight_schedule().unwrap_err();
            match err {
                AnalyticsError::InvalidWeight { ticker, valid_from, .. } => {
                    assert_eq!(ticker, "AAPL");
                    assert_eq!(valid_from, NaiveDate::from_ymd_opt(2024, 8, 13).unwrap());
                }
                other => panic!("expected InvalidWeight for {value}, got: {other}"),
            }
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let adapter = CsvAdapter::new(
            PathBuf::from("/nonexistent/prices.csv"),
            PathBuf::from("/nonexistent/weights.csv"),
        );
        assert!(adapter.fetch_prices().is_err());
        assert!(adapter.fetch_weight_schedule().is_err());
    }

    #[test]
    fn list_tickers_is_sorted_and_distinct() {
        let (_dir, adapter) = setup_test_data(
            "date,ticker,close\n\
             2024-08-12,MSFT,1\n\
             2024-08-12,AAPL,1\n\
             2024-08-13,MSFT,1\n",
            WEIGHTS,
        );
        assert_eq!(adapter.list_tickers().unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn explicit_paths_override_config() {
        use crate::adapters::file_config_adapter::FileConfigAdapter;

        let (dir, _) = setup_test_data("date,ticker,close\n2024-08-12,AAPL,1.0\n", WEIGHTS);
        let prices = dir.path().join("sample_prices.csv");
        let config = FileConfigAdapter::from_string(
            "[data]\nprices = /nonexistent/prices.csv\nweights = /nonexistent/weights.csv\n",
        )
        .unwrap();

        let adapter = CsvAdapter::from_config_with_paths(&config, Some(prices), None).unwrap();
        assert_eq!(adapter.fetch_prices().unwrap().len(), 1);
        assert!(adapter.fetch_weight_schedule().is_err());

        let missing = FileConfigAdapter::from_string("[data]\nprices = p.csv\n").unwrap();
        let err = CsvAdapter::from_config(&missing).err().unwrap();
        assert!(matches!(err, AnalyticsError::ConfigMissing { ref key, .. } if key == "weights"));
    }

    #[test]
    fn parse_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 8, 12).unwrap();
        assert_eq!(parse_date("2024-08-12").unwrap(), expected);
        assert_eq!(parse_date(" 2024-08-12T09:30:00 ").unwrap(), expected);
        assert!(parse_date("12/08/2024").is_err());
    }
}
