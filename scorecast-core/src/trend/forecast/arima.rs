use super::{Estimator, EstimatorKind};
use crate::trend::series::{mean, Series};

/// Fixed moving-average coefficient applied to the mean difference.
pub const MA_COEFFICIENT: f64 = 0.3;

/// Upper bound on roll-forward steps per forecast day, whatever the spacing.
pub const MAX_STEPS_PER_DAY: f64 = 24.0;

/// Simplified AR(1) + I(1) + MA(1).
///
/// The series is first-differenced; the AR coefficient comes from the lag-1
/// autocovariance of the differences. Each roll-forward step applies
/// `next_diff = phi * prev_diff + MA * mean_diff`.
#[derive(Debug, Clone)]
pub struct ArimaEstimator {
    phi: f64,
    mean_diff: f64,
    last_diff: f64,
    last_value: f64,
    spacing: f64,
    confidence: f64,
}

impl ArimaEstimator {
    pub fn new(series: &Series) -> Self {
        let diffs: Vec<f64> = series.ys.windows(2).map(|w| w[1] - w[0]).collect();
        let mean_diff = mean(&diffs);
        let phi = ar_coefficient(&diffs, mean_diff);
        Self {
            phi,
            mean_diff,
            last_diff: diffs.last().copied().unwrap_or(0.0),
            last_value: series.last_y(),
            spacing: series.mean_spacing(),
            confidence: one_step_confidence(&diffs, phi, mean_diff),
        }
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    fn steps(&self, horizon_days: f64) -> usize {
        let raw = if self.spacing > f64::EPSILON {
            horizon_days / self.spacing
        } else {
            horizon_days
        };
        let cap = (horizon_days.max(0.0).ceil() * MAX_STEPS_PER_DAY).max(1.0);
        raw.ceil().clamp(1.0, cap) as usize
    }
}

impl Estimator for ArimaEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Arima
    }

    fn predict(&self, horizon_days: f64) -> f64 {
        let mut prev = self.last_diff;
        let mut value = self.last_value;
        for _ in 0..self.steps(horizon_days) {
            let next = self.phi * prev + MA_COEFFICIENT * self.mean_diff;
            value += next;
            prev = next;
        }
        value
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

fn ar_coefficient(diffs: &[f64], mean_diff: f64) -> f64 {
    if diffs.len() < 2 {
        return 0.0;
    }
    let variance: f64 = diffs.iter().map(|d| (d - mean_diff).powi(2)).sum();
    if variance <= f64::EPSILON {
        return 0.0;
    }
    let autocov: f64 = diffs
        .windows(2)
        .map(|w| (w[1] - mean_diff) * (w[0] - mean_diff))
        .sum();
    (autocov / variance).clamp(-1.0, 1.0)
}

// 1 / (1 + rmse) of predicting each difference from its predecessor.
fn one_step_confidence(diffs: &[f64], phi: f64, mean_diff: f64) -> f64 {
    if diffs.len() < 2 {
        return 0.0;
    }
    let sse: f64 = diffs
        .windows(2)
        .map(|w| (w[1] - (phi * w[0] + MA_COEFFICIENT * mean_diff)).powi(2))
        .sum();
    let rmse = (sse / (diffs.len() - 1) as f64).sqrt();
    1.0 / (1.0 + rmse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityId, ScoreHistoryPoint};
    use chrono::{Duration, TimeZone, Utc};

    fn series(scores: &[f64], spacing_hours: i64) -> Series {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let history: Vec<_> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                ScoreHistoryPoint::new(
                    EntityId::new("e"),
                    t0 + Duration::hours(spacing_hours * i as i64),
                    *s,
                )
            })
            .collect();
        Series::from_history(&history)
    }

    #[test]
    fn constant_step_has_zero_phi() {
        let est = ArimaEstimator::new(&series(&[10.0, 12.0, 14.0, 16.0], 24));
        assert_eq!(est.phi(), 0.0);
        // each step adds 0.3 * 2
        assert!((est.predict(1.0) - 16.6).abs() < 1e-9);
        assert!((est.predict(3.0) - 17.8).abs() < 1e-9);
        assert!((est.confidence() - 1.0 / (1.0 + 1.4)).abs() < 1e-9);
    }

    #[test]
    fn alternating_diffs_give_negative_phi() {
        let est = ArimaEstimator::new(&series(&[50.0, 55.0, 50.0, 55.0, 50.0, 55.0], 24));
        assert!(est.phi() < 0.0);
        assert!(est.phi() >= -1.0);
    }

    #[test]
    fn steps_follow_spacing() {
        // two points per day: a 1-day horizon is two steps
        let est = ArimaEstimator::new(&series(&[10.0, 12.0, 14.0], 12));
        assert_eq!(est.steps(1.0), 2);
        assert_eq!(est.steps(0.1), 1);
    }

    #[test]
    fn dense_series_steps_are_capped() {
        // one point per second: uncapped this would be ~2.6M steps
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let history: Vec<_> = (0..50)
            .map(|i| {
                ScoreHistoryPoint::new(
                    EntityId::new("e"),
                    t0 + Duration::seconds(i),
                    60.0 + i as f64,
                )
            })
            .collect();
        let est = ArimaEstimator::new(&Series::from_history(&history));
        assert_eq!(est.steps(30.0), 720);
        assert_eq!(est.steps(0.5), 24);
        assert!(est.predict(30.0).is_finite());
    }

    #[test]
    fn two_points_have_no_confidence() {
        let est = ArimaEstimator::new(&series(&[10.0, 20.0], 24));
        assert_eq!(est.confidence(), 0.0);
        assert_eq!(est.phi(), 0.0);
    }
}
