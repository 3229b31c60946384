use crate::calc::{round_2_decimals, CoreError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub current: f64,
    pub next_score: f64,
    pub trend: Trend,
    /// R² of the fit as a percentage; negative when the line does worse than
    /// the mean.
    pub confidence: f64,
    pub slope: f64,
    pub intercept: f64,
    pub points: usize,
}

/// Ordinary least squares over (index, value) pairs. Returns slope and
/// intercept. Needs at least two points.
fn fit_line(history: &[f64]) -> (f64, f64) {
    let n = history.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = history.iter().sum::<f64>() / n;

    let mut sxy = 0.0_f64;
    let mut sxx = 0.0_f64;
    for (i, y) in history.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }
    let slope = sxy / sxx;
    (slope, mean_y - slope * mean_x)
}

fn r_squared(history: &[f64], slope: f64, intercept: f64) -> f64 {
    // Flat history: the line passes through every point. Checked on the raw
    // values since the mean of an inexact value like 58.33 carries noise.
    if history.iter().all(|y| *y == history[0]) {
        return 1.0;
    }
    let n = history.len() as f64;
    let mean_y = history.iter().sum::<f64>() / n;
    let mut ss_res = 0.0_f64;
    let mut ss_tot = 0.0_f64;
    for (i, y) in history.iter().enumerate() {
        let fitted = slope * i as f64 + intercept;
        ss_res += (y - fitted).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }
    1.0 - ss_res / ss_tot
}

/// Projects the value one step past the end of `history` (earliest first).
pub fn predict_next(history: &[f64]) -> Result<Prediction, CoreError> {
    if history.len() < 2 {
        return Err(CoreError::InsufficientData {
            points: history.len(),
        });
    }
    let (slope, intercept) = fit_line(history);
    let n = history.len();
    let raw = slope * n as f64 + intercept;
    let next_score = round_2_decimals(raw).clamp(0.0, 100.0);

    let current = history[n - 1];
    let trend = if next_score > current {
        Trend::Improving
    } else if next_score < current {
        Trend::Declining
    } else {
        Trend::Stable
    };

    Ok(Prediction {
        current,
        next_score,
        trend,
        confidence: round_2_decimals(r_squared(history, slope, intercept) * 100.0),
        slope,
        intercept,
        points: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_is_insufficient() {
        let err = predict_next(&[72.5]).unwrap_err();
        assert_eq!(err, CoreError::InsufficientData { points: 1 });
        assert!(predict_next(&[]).is_err());
    }

    #[test]
    fn projection_is_clamped() {
        let p = predict_next(&[95.0, 99.0]).expect("prediction");
        assert_eq!(p.next_score, 100.0);
        assert_eq!(p.trend, Trend::Improving);
        assert_eq!(p.confidence, 100.0);

        let p = predict_next(&[10.0, 3.0]).expect("prediction");
        assert_eq!(p.next_score, 0.0);
        assert_eq!(p.trend, Trend::Declining);
    }

    #[test]
    fn increasing_history_improves() {
        let p = predict_next(&[50.0, 55.0, 58.0, 66.0]).expect("prediction");
        assert_eq!(p.trend, Trend::Improving);
        assert_eq!(p.current, 66.0);
        // slope 5.1, intercept 49.6 → 70 at x = 4
        assert!((p.slope - 5.1).abs() < 1e-9);
        assert_eq!(p.next_score, 70.0);
        assert!(p.confidence > 90.0 && p.confidence <= 100.0);
    }

    #[test]
    fn flat_history_is_stable() {
        let p = predict_next(&[70.0, 70.0, 70.0]).expect("prediction");
        assert_eq!(p.next_score, 70.0);
        assert_eq!(p.trend, Trend::Stable);
        assert_eq!(p.confidence, 100.0);
    }

    #[test]
    fn flat_inexact_history_reports_full_confidence() {
        for (value, n) in [(58.33, 3), (0.83, 5), (76.67, 6), (33.33, 2)] {
            let history = vec![value; n];
            let p = predict_next(&history).expect("prediction");
            assert_eq!(p.confidence, 100.0, "history {:?}", history);
            assert_eq!(p.next_score, value, "history {:?}", history);
            assert_eq!(p.trend, Trend::Stable, "history {:?}", history);
        }
    }

    #[test]
    fn noisy_history_reports_partial_fit() {
        let p = predict_next(&[60.0, 80.0, 60.0, 80.0]).expect("prediction");
        // slope 4, intercept 64 → 80 at x = 4; R² = 0.2
        assert_eq!(p.next_score, 80.0);
        assert_eq!(p.trend, Trend::Stable);
        assert_eq!(p.confidence, 20.0);
    }
}
