//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::html_report_adapter::HtmlReportAdapter;
use crate::domain::anomaly::{AnomalyConfig, DEFAULT_ANOMALY_THRESHOLD, DEFAULT_ANOMALY_WINDOW};
use crate::domain::config_validation::validate_analytics_config;
use crate::domain::error::AnalyticsError;
use crate::domain::metrics::{SummaryMetrics, DEFAULT_RECENT_ANOMALY_DAYS};
use crate::domain::pipeline::{run_pipeline, PipelineConfig, PipelineOutput};
use crate::domain::risk::{RiskConfig, DEFAULT_RISK_WINDOW, DEFAULT_VAR_CONFIDENCE};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_OUTDIR: &str = "reports";

#[derive(Parser, Debug)]
#[command(name = "equitrace", about = "Portfolio performance and risk analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the analytics pipeline and write reports
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overrides [data] prices and forces the CSV source
        #[arg(long)]
        prices: Option<PathBuf>,
        /// Weight schedule CSV, overrides [data] weights
        #[arg(long)]
        weights: Option<PathBuf>,
        #[arg(short, long)]
        outdir: Option<PathBuf>,
    },
    /// Validate configuration and input data without computing
    Check {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        prices: Option<PathBuf>,
        #[arg(long)]
        weights: Option<PathBuf>,
    },
    /// Load price and weight CSVs into the configured SQLite database
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        prices: Option<PathBuf>,
        #[arg(long)]
        weights: Option<PathBuf>,
    },
}

/// Command-line replacements for the `[data]` paths.
#[derive(Debug, Default, Clone)]
pub struct DataOverrides {
    pub prices: Option<PathBuf>,
    pub weights: Option<PathBuf>,
}

impl DataOverrides {
    fn is_empty(&self) -> bool {
        self.prices.is_none() && self.weights.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub outdir: PathBuf,
    pub html: bool,
}

/// Counts gathered by `check`.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCheck {
    pub price_rows: usize,
    pub tickers: usize,
    pub dates: usize,
    pub invalid_closes: usize,
    pub weight_rules: usize,
    /// Tickers with a weight rule but no prices.
    pub unpriced_tickers: Vec<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            prices,
            weights,
            outdir,
        } => run_command(&config, DataOverrides { prices, weights }, outdir),
        Command::Check {
            config,
            prices,
            weights,
        } => check_command(&config, DataOverrides { prices, weights }),
        Command::Import {
            config,
            prices,
            weights,
        } => import_command(&config, DataOverrides { prices, weights }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, AnalyticsError> {
    FileConfigAdapter::from_file(path).map_err(|e| AnalyticsError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn run_command(
    config_path: &Path,
    overrides: DataOverrides,
    outdir: Option<PathBuf>,
) -> Result<(), AnalyticsError> {
    info!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_analytics_config(&config)?;

    let pipeline_config = build_pipeline_config(&config)?;
    let report = build_report_settings(&config, outdir);
    let data_port = build_data_port(&config, &overrides)?;

    let (output, written) = run_analysis(data_port.as_ref(), &pipeline_config, &report)?;

    print!(
        "{}",
        format_summary(&output.summary, pipeline_config.recent_anomaly_days)
    );
    info!(
        "Wrote {} report files to {}",
        written.len(),
        report.outdir.display()
    );
    Ok(())
}

fn check_command(config_path: &Path, overrides: DataOverrides) -> Result<(), AnalyticsError> {
    let config = load_config(config_path)?;
    validate_analytics_config(&config)?;
    build_pipeline_config(&config)?;
    let data_port = build_data_port(&config, &overrides)?;

    let check = check_data(data_port.as_ref())?;
    println!("Price rows:     {}", check.price_rows);
    println!("Tickers:        {}", check.tickers);
    println!("Dates:          {}", check.dates);
    println!("Invalid closes: {}", check.invalid_closes);
    println!("Weight rules:   {}", check.weight_rules);
    if !check.unpriced_tickers.is_empty() {
        println!("Unpriced:       {}", check.unpriced_tickers.join(", "));
    }
    Ok(())
}

#[cfg(feature = "sqlite")]
fn import_command(config_path: &Path, overrides: DataOverrides) -> Result<(), AnalyticsError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let config = load_config(config_path)?;
    let source = build_csv_adapter(&config, &overrides)?;
    let target = SqliteAdapter::from_config(&config)?;

    let (prices, rules) = import_into_sqlite(&source, &target)?;
    println!("Imported {} price rows and {} weight rules", prices, rules);
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn import_command(config_path: &Path, overrides: DataOverrides) -> Result<(), AnalyticsError> {
    let _ = (config_path, overrides);
    Err(sqlite_unavailable())
}

/// Replace the contents of `target` with everything `source` supplies.
#[cfg(feature = "sqlite")]
pub fn import_into_sqlite(
    source: &dyn DataPort,
    target: &crate::adapters::sqlite_adapter::SqliteAdapter,
) -> Result<(usize, usize), AnalyticsError> {
    let prices = source.fetch_prices()?;
    let rules = source.fetch_weight_schedule()?;

    target.replace_all(&prices, &rules)?;

    info!(prices = prices.len(), rules = rules.len(), "imported into sqlite");
    Ok((prices.len(), rules.len()))
}

/// Fetch inputs, run the pipeline, and write the CSV tables plus the
/// optional HTML summary.
pub fn run_analysis(
    data_port: &dyn DataPort,
    config: &PipelineConfig,
    report: &ReportSettings,
) -> Result<(PipelineOutput, Vec<PathBuf>), AnalyticsError> {
    let prices = data_port.fetch_prices()?;
    let rules = data_port.fetch_weight_schedule()?;
    info!(
        "Loaded {} price rows and {} weight rules",
        prices.len(),
        rules.len()
    );

    let output = run_pipeline(&prices, &rules, config)?;

    let mut written = CsvReportAdapter::new().write(&output, &report.outdir)?;
    if report.html {
        written.extend(
            HtmlReportAdapter::new(config.recent_anomaly_days).write(&output, &report.outdir)?,
        );
    }

    Ok((output, written))
}

pub fn check_data(data_port: &dyn DataPort) -> Result<DataCheck, AnalyticsError> {
    let prices = data_port.fetch_prices()?;
    let rules = data_port.fetch_weight_schedule()?;

    let tickers: BTreeSet<&str> = prices.iter().map(|p| p.ticker.as_str()).collect();
    let dates: BTreeSet<_> = prices.iter().map(|p| p.date).collect();
    let unpriced_tickers = rules
        .iter()
        .map(|r| r.ticker.as_str())
        .filter(|t| !tickers.contains(t))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(DataCheck {
        price_rows: prices.len(),
        tickers: tickers.len(),
        dates: dates.len(),
        invalid_closes: prices.iter().filter(|p| !p.is_valid_close()).count(),
        weight_rules: rules.len(),
        unpriced_tickers,
    })
}

fn positive_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, AnalyticsError> {
    let raw = config.get_int(section, key, default as i64);
    usize::try_from(raw)
        .ok()
        .filter(|v| *v >= 1)
        .ok_or_else(|| AnalyticsError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("expected a positive integer, got {}", raw),
        })
}

pub fn build_pipeline_config(config: &dyn ConfigPort) -> Result<PipelineConfig, AnalyticsError> {
    let risk = RiskConfig {
        window: positive_usize(config, "risk", "window", DEFAULT_RISK_WINDOW)?,
        confidence: config.get_double("risk", "confidence", DEFAULT_VAR_CONFIDENCE),
    };

    let anomaly_window = positive_usize(config, "anomaly", "window", DEFAULT_ANOMALY_WINDOW)?;
    let anomaly = AnomalyConfig {
        window: anomaly_window,
        min_history: positive_usize(config, "anomaly", "min_history", anomaly_window)?,
        threshold: config.get_double("anomaly", "threshold", DEFAULT_ANOMALY_THRESHOLD),
    };

    Ok(PipelineConfig {
        risk,
        anomaly,
        recent_anomaly_days: positive_usize(
            config,
            "summary",
            "recent_anomaly_days",
            DEFAULT_RECENT_ANOMALY_DAYS,
        )?,
    })
}

pub fn build_report_settings(config: &dyn ConfigPort, outdir: Option<PathBuf>) -> ReportSettings {
    let outdir = outdir.unwrap_or_else(|| {
        PathBuf::from(
            config
                .get_path("report", "outdir")
                .unwrap_or_else(|| DEFAULT_OUTDIR.to_string()),
        )
    });
    ReportSettings {
        outdir,
        html: config.get_bool("report", "html", true),
    }
}

fn build_csv_adapter(
    config: &dyn ConfigPort,
    overrides: &DataOverrides,
) -> Result<CsvAdapter, AnalyticsError> {
    CsvAdapter::from_config_with_paths(
        config,
        overrides.prices.clone(),
        overrides.weights.clone(),
    )
}

/// Pick the data adapter for `[data] source`. Path overrides always select
/// the CSV adapter.
pub fn build_data_port(
    config: &dyn ConfigPort,
    overrides: &DataOverrides,
) -> Result<Box<dyn DataPort>, AnalyticsError> {
    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "csv".to_string());

    if source == "csv" || !overrides.is_empty() {
        return Ok(Box::new(build_csv_adapter(config, overrides)?));
    }

    match source.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            Ok(Box::new(SqliteAdapter::from_config(config)?))
        }
        #[cfg(not(feature = "sqlite"))]
        "sqlite" => Err(sqlite_unavailable()),
        other => Err(AnalyticsError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source '{}', expected csv or sqlite", other),
        }),
    }
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_unavailable() -> AnalyticsError {
    AnalyticsError::ConfigInvalid {
        section: "data".into(),
        key: "source".into(),
        reason: "built without the sqlite feature".into(),
    }
}

pub fn format_summary(summary: &SummaryMetrics, recent_anomaly_days: usize) -> String {
    format!(
        "Total Return: {:.4}\n\
         Volatility (ann): {:.4}\n\
         Sharpe (ann): {:.3}\n\
         Max Drawdown: {:.4}\n\
         30d Vol (ann): {:.4}\n\
         Anomaly Days (last {}): {}\n",
        summary.total_return,
        summary.vol_ann,
        summary.sharpe,
        summary.max_dd,
        summary.vol_30d_ann,
        recent_anomaly_days,
        summary.anomalies_60,
    )
}
