//! CSV report adapter implementing ReportPort.
//!
//! Writes the two input tables and one long-format table per pipeline
//! stage into the output directory.

use crate::domain::error::AnalyticsError;
use crate::domain::pipeline::PipelineOutput;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PRICES_FILE: &str = "prices.csv";
pub const RULES_FILE: &str = "weights.csv";
pub const RETURNS_FILE: &str = "returns.csv";
pub const WEIGHTS_FILE: &str = "weights_by_date.csv";
pub const PORTFOLIO_RETURNS_FILE: &str = "portfolio_returns.csv";
pub const PORTFOLIO_PATH_FILE: &str = "portfolio_path.csv";
pub const DRAWDOWN_FILE: &str = "drawdown.csv";
pub const RISK_FILE: &str = "risk_30d.csv";
pub const ANOMALIES_FILE: &str = "anomalies.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn report_err(path: &Path, e: impl std::fmt::Display) -> AnalyticsError {
    AnalyticsError::Report {
        reason: format!("{}: {}", path.display(), e),
    }
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write `header` and `rows` to `dir/name`.
fn write_table<I>(
    dir: &Path,
    name: &str,
    header: &[&str],
    rows: I,
) -> Result<PathBuf, AnalyticsError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let path = dir.join(name);
    let mut wtr = csv::Writer::from_path(&path).map_err(|e| report_err(&path, e))?;
    wtr.write_record(header).map_err(|e| report_err(&path, e))?;
    for row in rows {
        wtr.write_record(&row).map_err(|e| report_err(&path, e))?;
    }
    wtr.flush()?;
    Ok(path)
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        output: &PipelineOutput,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, AnalyticsError> {
        fs::create_dir_all(output_dir)?;

        let mut written = Vec::with_capacity(10);

        written.push(write_table(
            output_dir,
            PRICES_FILE,
            &["date", "ticker", "close"],
            output.prices.iter().map(|p| {
                let close = if p.close.is_nan() {
                    String::new()
                } else {
                    p.close.to_string()
                };
                vec![p.date.to_string(), p.ticker.clone(), close]
            }),
        )?);

        written.push(write_table(
            output_dir,
            RULES_FILE,
            &["valid_from", "ticker", "weight"],
            output.rules.iter().map(|r| {
                vec![r.valid_from.to_string(), r.ticker.clone(), r.weight.to_string()]
            }),
        )?);

        written.push(write_table(
            output_dir,
            RETURNS_FILE,
            &["date", "ticker", "ret"],
            output
                .returns
                .iter()
                .map(|r| vec![r.date.to_string(), r.ticker.clone(), r.ret.to_string()]),
        )?);

        written.push(write_table(
            output_dir,
            WEIGHTS_FILE,
            &["date", "ticker", "weight"],
            output
                .weights
                .iter()
                .map(|w| vec![w.date.to_string(), w.ticker.clone(), w.weight.to_string()]),
        )?);

        written.push(write_table(
            output_dir,
            PORTFOLIO_RETURNS_FILE,
            &["date", "port_ret"],
            output
                .portfolio_returns
                .iter()
                .map(|p| vec![p.date.to_string(), p.port_ret.to_string()]),
        )?);

        written.push(write_table(
            output_dir,
            PORTFOLIO_PATH_FILE,
            &["date", "port_cum"],
            output
                .path
                .iter()
                .map(|p| vec![p.date.to_string(), p.port_cum.to_string()]),
        )?);

        written.push(write_table(
            output_dir,
            DRAWDOWN_FILE,
            &["date", "drawdown"],
            output
                .drawdowns
                .iter()
                .map(|d| vec![d.date.to_string(), d.drawdown.to_string()]),
        )?);

        written.push(write_table(
            output_dir,
            RISK_FILE,
            &["date", "var_30d", "vol_30d", "value_at_risk"],
            output.risk.iter().map(|r| {
                vec![
                    r.date.to_string(),
                    opt(r.var_30d),
                    opt(r.vol_30d),
                    opt(r.value_at_risk),
                ]
            }),
        )?);

        written.push(write_table(
            output_dir,
            ANOMALIES_FILE,
            &["date", "port_ret", "z_score", "is_anomaly"],
            output.anomalies.iter().map(|a| {
                vec![
                    a.date.to_string(),
                    a.port_ret.to_string(),
                    opt(a.z_score),
                    a.is_anomaly.to_string(),
                ]
            }),
        )?);

        let s = &output.summary;
        written.push(write_table(
            output_dir,
            SUMMARY_FILE,
            &[
                "total_return",
                "vol_ann",
                "sharpe",
                "max_dd",
                "vol_30d_ann",
                "anomalies_60",
            ],
            std::iter::once(vec![
                s.total_return.to_string(),
                s.vol_ann.to_string(),
                s.sharpe.to_string(),
                s.max_dd.to_string(),
                s.vol_30d_ann.to_string(),
                s.anomalies_60.to_string(),
            ]),
        )?);

        info!(files = written.len(), dir = %output_dir.display(), "wrote CSV report");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::{run_pipeline, PipelineConfig};
    use crate::domain::price::PricePoint;
    use crate::domain::weights::WeightRule;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample_output() -> PipelineOutput {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let prices: Vec<PricePoint> = (0..5)
            .flat_map(|i| {
                let date = start + chrono::Duration::days(i);
                vec![
                    PricePoint::new(date, "AAA", 100.0 * 1.01f64.powi(i as i32)),
                    PricePoint::new(date, "BBB", 50.0 + i as f64),
                ]
            })
            .collect();
        let rules = vec![
            WeightRule::new(start, "AAA", 0.6),
            WeightRule::new(start, "BBB", 0.4),
        ];
        run_pipeline(&prices, &rules, &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn writes_every_table() {
        let dir = tempdir().unwrap();
        let output = sample_output();

        let written = CsvReportAdapter::new().write(&output, dir.path()).unwrap();

        assert_eq!(written.len(), 10);
        for name in [
            PRICES_FILE,
            RULES_FILE,
            RETURNS_FILE,
            WEIGHTS_FILE,
            PORTFOLIO_RETURNS_FILE,
            PORTFOLIO_PATH_FILE,
            DRAWDOWN_FILE,
            RISK_FILE,
            ANOMALIES_FILE,
            SUMMARY_FILE,
        ] {
            assert!(dir.path().join(name).exists(), "missing {name}");
        }
    }

    #[test]
    fn input_tables_echo_prices_and_rules() {
        let dir = tempdir().unwrap();
        let mut output = sample_output();
        output.prices[1].close = f64::NAN;
        CsvReportAdapter::new().write(&output, dir.path()).unwrap();

        let prices = fs::read_to_string(dir.path().join(PRICES_FILE)).unwrap();
        let lines: Vec<&str> = prices.lines().collect();
        assert_eq!(lines[0], "date,ticker,close");
        assert_eq!(lines.len(), 1 + 10);
        assert_eq!(lines[1], "2024-01-01,AAA,100");
        assert_eq!(lines[2], "2024-01-01,BBB,");

        let rules = fs::read_to_string(dir.path().join(RULES_FILE)).unwrap();
        assert_eq!(
            rules.lines().collect::<Vec<_>>(),
            vec!["valid_from,ticker,weight", "2024-01-01,AAA,0.6", "2024-01-01,BBB,0.4"]
        );
    }

    #[test]
    fn returns_table_has_one_row_per_return() {
        let dir = tempdir().unwrap();
        let output = sample_output();
        CsvReportAdapter::new().write(&output, dir.path()).unwrap();

        let contents = fs::read_to_string(dir.path().join(RETURNS_FILE)).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "date,ticker,ret");
        assert_eq!(lines.len(), 1 + output.returns.len());
        assert!(lines[1].starts_with("2024-01-02,AAA,"));
    }

    #[test]
    fn warmup_risk_values_are_empty_fields() {
        let dir = tempdir().unwrap();
        let output = sample_output();
        CsvReportAdapter::new().write(&output, dir.path()).unwrap();

        let contents = fs::read_to_string(dir.path().join(RISK_FILE)).unwrap();
        let first_row = contents.lines().nth(1).unwrap();
        assert_eq!(first_row, "2024-01-02,,,");
    }

    #[test]
    fn summary_has_single_row() {
        let dir = tempdir().unwrap();
        let output = sample_output();
        CsvReportAdapter::new().write(&output, dir.path()).unwrap();

        let contents = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.starts_with("total_return,vol_ann,sharpe,max_dd,vol_30d_ann,anomalies_60"));
    }

    #[test]
    fn creates_nested_output_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested/deep/reports");
        CsvReportAdapter::new()
            .write(&sample_output(), &nested)
            .unwrap();
        assert!(nested.join(SUMMARY_FILE).exists());
    }
}
