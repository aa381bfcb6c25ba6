//! Running peak-to-trough drawdown.
//!
//! DD[i] = CUM[i] / max(CUM[0..=i]) - 1

use crate::domain::portfolio::PortfolioPathPoint;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub drawdown: f64,
}

pub fn compute_drawdowns(path: &[PortfolioPathPoint]) -> Vec<DrawdownPoint> {
    let mut peak = f64::NEG_INFINITY;

    path.iter()
        .map(|point| {
            if point.port_cum > peak {
                peak = point.port_cum;
            }
            let drawdown = if peak > 0.0 {
                // Clamp without `min`, which would turn a NaN into 0.
                let dd = point.port_cum / peak - 1.0;
                if dd > 0.0 { 0.0 } else { dd }
            } else {
                0.0
            };
            DrawdownPoint {
                date: point.date,
                drawdown,
            }
        })
        .collect()
}

/// Most negative drawdown, or 0.0 for an empty series. A NaN drawdown is
/// propagated rather than skipped.
pub fn max_drawdown(drawdowns: &[DrawdownPoint]) -> f64 {
    drawdowns
        .iter()
        .map(|d| d.drawdown)
        .fold(0.0_f64, |worst, dd| {
            if worst.is_nan() || dd.is_nan() {
                f64::NAN
            } else {
                worst.min(dd)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_path(values: &[f64]) -> Vec<PortfolioPathPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| PortfolioPathPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                port_cum: v,
            })
            .collect()
    }

    #[test]
    fn drawdown_tracks_running_peak() {
        let path = make_path(&[1.0, 1.1, 0.9, 0.95, 0.8, 1.2]);
        let dd = compute_drawdowns(&path);

        assert_eq!(dd.len(), 6);
        assert_eq!(dd[0].drawdown, 0.0);
        assert_eq!(dd[1].drawdown, 0.0);
        assert_relative_eq!(dd[2].drawdown, 0.9 / 1.1 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(dd[4].drawdown, 0.8 / 1.1 - 1.0, epsilon = 1e-12);
        assert_eq!(dd[5].drawdown, 0.0);
    }

    #[test]
    fn first_point_below_one_is_not_a_drawdown() {
        let path = make_path(&[0.98, 0.97]);
        let dd = compute_drawdowns(&path);
        assert_eq!(dd[0].drawdown, 0.0);
        assert_relative_eq!(dd[1].drawdown, 0.97 / 0.98 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn max_drawdown_is_most_negative() {
        let path = make_path(&[1.0, 1.1, 0.9, 0.95, 0.8, 1.0]);
        let dd = compute_drawdowns(&path);
        assert_relative_eq!(max_drawdown(&dd), 0.8 / 1.1 - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_path() {
        assert!(compute_drawdowns(&[]).is_empty());
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn nan_cumulative_value_is_not_masked() {
        let path = make_path(&[1.0, f64::NAN, 0.9]);
        let dd = compute_drawdowns(&path);
        assert!(dd[1].drawdown.is_nan());
        assert_relative_eq!(dd[2].drawdown, -0.1, epsilon = 1e-12);
        assert!(max_drawdown(&dd).is_nan());
    }

    #[test]
    fn wiped_out_path_stays_at_full_loss() {
        let path = make_path(&[1.05, 0.0, 0.0]);
        let dd = compute_drawdowns(&path);
        assert_eq!(dd[1].drawdown, -1.0);
        assert_eq!(dd[2].drawdown, -1.0);
    }
}
