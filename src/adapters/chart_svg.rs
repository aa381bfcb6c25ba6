//! Inline SVG charts for the HTML report.

use chrono::NaiveDate;

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 260.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 25.0;
const MARGIN_BOTTOM: f64 = 30.0;

#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub stroke: &'static str,
    /// Fill the area between the series and zero.
    pub fill: Option<&'static str>,
}

pub const PATH_STYLE: ChartStyle = ChartStyle {
    stroke: "#2563eb",
    fill: None,
};

pub const DRAWDOWN_STYLE: ChartStyle = ChartStyle {
    stroke: "#dc2626",
    fill: Some("rgba(239,68,68,0.3)"),
};

pub const RISK_STYLE: ChartStyle = ChartStyle {
    stroke: "#7c3aed",
    fill: None,
};

/// Render a dated series as an SVG line chart. Empty input renders nothing.
///
/// `format_value` labels the y axis.
pub fn line_chart(
    title: &str,
    series: &[(NaiveDate, f64)],
    style: ChartStyle,
    format_value: fn(f64) -> String,
) -> String {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return String::new();
    };

    let mut min_v = series.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let mut max_v = series.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    if style.fill.is_some() {
        min_v = min_v.min(0.0);
        max_v = max_v.max(0.0);
    }
    let range = if max_v - min_v > 0.0 {
        max_v - min_v
    } else {
        1.0
    };

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;

    let x_scale =
        |i: usize| -> f64 { MARGIN_LEFT + (i as f64 / (series.len() - 1).max(1) as f64) * plot_width };
    let y_scale = |v: f64| -> f64 { MARGIN_TOP + plot_height - ((v - min_v) / range) * plot_height };

    let mut path_data = String::new();
    for (i, &(_, v)) in series.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        path_data.push_str(&format!("{} {:.1} {:.1}", cmd, x_scale(i), y_scale(v)));
    }
    let fill = match style.fill {
        Some(fill) => {
            path_data.push_str(&format!(
                " L {:.1} {:.1} L {:.1} {:.1} Z",
                x_scale(series.len() - 1),
                y_scale(0.0),
                x_scale(0),
                y_scale(0.0)
            ));
            fill
        }
        None => "none",
    };

    let mid_date = series[series.len() / 2].0;

    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"##,
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"15\" text-anchor=\"end\" font-size=\"12\" fill=\"#666\">{}</text>\n",
        CHART_WIDTH - MARGIN_RIGHT,
        title
    ));
    svg.push_str(&format!(
        "  <line x1=\"{l}\" y1=\"{t}\" x2=\"{l}\" y2=\"{b}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{l}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        l = MARGIN_LEFT,
        b = CHART_HEIGHT - MARGIN_BOTTOM,
        r = CHART_WIDTH - MARGIN_RIGHT
    ));
    for (y, v) in [
        (MARGIN_TOP + 5.0, max_v),
        (MARGIN_TOP + plot_height / 2.0, (max_v + min_v) / 2.0),
        (CHART_HEIGHT - MARGIN_BOTTOM - 5.0, min_v),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            MARGIN_LEFT - 5.0,
            y,
            format_value(v)
        ));
    }
    for (x, date) in [
        (MARGIN_LEFT, first.0),
        (MARGIN_LEFT + plot_width / 2.0, mid_date),
        (CHART_WIDTH - MARGIN_RIGHT, last.0),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            x, CHART_HEIGHT, date
        ));
    }
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\"/>\n",
        path_data, fill, style.stroke
    ));
    svg.push_str("</svg>");
    svg
}

pub fn fmt_ratio(v: f64) -> String {
    format!("{:.3}", v)
}

pub fn fmt_pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}
