//! HTML report adapter implementing ReportPort.
//!
//! Renders a single `summary.html` with the headline metrics and inline SVG
//! charts of the portfolio path, drawdown, and rolling volatility.

use std::fs;
use std::path::{Path, PathBuf};

use crate::adapters::chart_svg::{
    fmt_pct, fmt_ratio, line_chart, DRAWDOWN_STYLE, PATH_STYLE, RISK_STYLE,
};
use crate::domain::error::AnalyticsError;
use crate::domain::metrics::DEFAULT_RECENT_ANOMALY_DAYS;
use crate::domain::pipeline::PipelineOutput;
use crate::ports::report_port::ReportPort;

use askama::Template;
use tracing::info;

pub const HTML_FILE: &str = "summary.html";

struct MetricRow {
    label: String,
    value: String,
}

struct AnomalyRow {
    date: String,
    port_ret: String,
    z_score: String,
}

struct SkippedRow {
    ticker: String,
    reason: String,
}

#[derive(Template)]
#[template(
    ext = "html",
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Portfolio Summary</title>
<style>
body { font-family: sans-serif; margin: 2em; color: #222; }
table { border-collapse: collapse; margin-bottom: 1.5em; }
th, td { border: 1px solid #ddd; padding: 4px 10px; text-align: right; }
th { background: #f5f5f5; text-align: left; }
</style>
</head>
<body>
<h1>Portfolio Summary</h1>
<p>{{ start_date }} to {{ end_date }}</p>
<table>
{% for row in metrics %}<tr><th>{{ row.label }}</th><td>{{ row.value }}</td></tr>
{% endfor %}</table>
<h2>Portfolio Path</h2>
{{ path_svg|safe }}
<h2>Drawdown</h2>
{{ drawdown_svg|safe }}
<h2>Rolling Volatility</h2>
{{ risk_svg|safe }}
{% if !anomalies.is_empty() %}<h2>Anomalies</h2>
<table>
<tr><th>Date</th><th>Return</th><th>Z-Score</th></tr>
{% for a in anomalies %}<tr><td>{{ a.date }}</td><td>{{ a.port_ret }}</td><td>{{ a.z_score }}</td></tr>
{% endfor %}</table>
{% endif %}{% if !skipped.is_empty() %}<h2>Skipped Tickers</h2>
<table>
{% for s in skipped %}<tr><th>{{ s.ticker }}</th><td>{{ s.reason }}</td></tr>
{% endfor %}</table>
{% endif %}</body>
</html>
"#
)]
struct SummaryTemplate {
    start_date: String,
    end_date: String,
    metrics: Vec<MetricRow>,
    path_svg: String,
    drawdown_svg: String,
    risk_svg: String,
    anomalies: Vec<AnomalyRow>,
    skipped: Vec<SkippedRow>,
}

pub struct HtmlReportAdapter {
    recent_anomaly_days: usize,
}

impl HtmlReportAdapter {
    pub fn new(recent_anomaly_days: usize) -> Self {
        Self {
            recent_anomaly_days,
        }
    }

    fn build_template(&self, output: &PipelineOutput) -> SummaryTemplate {
        let s = &output.summary;
        let metrics = vec![
            MetricRow {
                label: "Total Return".into(),
                value: fmt_pct(s.total_return),
            },
            MetricRow {
                label: "Volatility (ann)".into(),
                value: fmt_pct(s.vol_ann),
            },
            MetricRow {
                label: "Sharpe (ann)".into(),
                value: format!("{:.3}", s.sharpe),
            },
            MetricRow {
                label: "Max Drawdown".into(),
                value: fmt_pct(s.max_dd),
            },
            MetricRow {
                label: "30d Vol (ann)".into(),
                value: fmt_pct(s.vol_30d_ann),
            },
            MetricRow {
                label: format!("Anomaly Days (last {})", self.recent_anomaly_days),
                value: s.anomalies_60.to_string(),
            },
        ];

        let path: Vec<_> = output.path.iter().map(|p| (p.date, p.port_cum)).collect();
        let drawdown: Vec<_> = output
            .drawdowns
            .iter()
            .map(|d| (d.date, d.drawdown))
            .collect();
        let vol: Vec<_> = output
            .risk
            .iter()
            .filter_map(|r| r.vol_30d.map(|v| (r.date, v)))
            .collect();

        let anomalies = output
            .anomalies
            .iter()
            .filter(|a| a.is_anomaly)
            .map(|a| AnomalyRow {
                date: a.date.to_string(),
                port_ret: fmt_pct(a.port_ret),
                z_score: a.z_score.map(|z| format!("{:.2}", z)).unwrap_or_default(),
            })
            .collect();

        let skipped = output
            .skipped
            .iter()
            .map(|s| SkippedRow {
                ticker: s.ticker.clone(),
                reason: s.error.to_string(),
            })
            .collect();

        SummaryTemplate {
            start_date: output
                .path
                .first()
                .map(|p| p.date.to_string())
                .unwrap_or_default(),
            end_date: output
                .path
                .last()
                .map(|p| p.date.to_string())
                .unwrap_or_default(),
            metrics,
            path_svg: line_chart("Cumulative Value", &path, PATH_STYLE, fmt_ratio),
            drawdown_svg: line_chart("Drawdown", &drawdown, DRAWDOWN_STYLE, fmt_pct),
            risk_svg: line_chart("Rolling Volatility (daily)", &vol, RISK_STYLE, fmt_pct),
            anomalies,
            skipped,
        }
    }
}

impl Default for HtmlReportAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_ANOMALY_DAYS)
    }
}

impl ReportPort for HtmlReportAdapter {
    fn write(
        &self,
        output: &PipelineOutput,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, AnalyticsError> {
        let html = self
            .build_template(output)
            .render()
            .map_err(|e| AnalyticsError::Report {
                reason: e.to_string(),
            })?;

        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(HTML_FILE);
        fs::write(&path, html)?;

        info!(path = %path.display(), "wrote HTML summary");
        Ok(vec![path])
    }
}
