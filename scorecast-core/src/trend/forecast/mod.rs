//! Three-estimator forecast ensemble.

mod arima;
mod linear;
mod pattern;

pub use arima::{ArimaEstimator, MAX_STEPS_PER_DAY, MA_COEFFICIENT};
pub use linear::LinearEstimator;
pub use pattern::{PatternEstimator, LOOKBACK, PATTERN_BLEND};

use serde::{Deserialize, Serialize};

use super::regression::LinearFit;
use super::series::Series;
use crate::domain::{clamp_score, round_to, ScoreHistoryPoint};

/// Discount applied to the mean estimator confidence: a forecast is less
/// certain than a fit.
pub const FORECAST_DISCOUNT: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    Linear,
    Arima,
    Pattern,
}

impl EstimatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimatorKind::Linear => "linear",
            EstimatorKind::Arima => "arima",
            EstimatorKind::Pattern => "pattern",
        }
    }
}

/// A single forecasting model over a prepared series.
pub trait Estimator {
    fn kind(&self) -> EstimatorKind;

    /// Unclamped point estimate `horizon_days` after the last observation.
    fn predict(&self, horizon_days: f64) -> f64;

    /// Model confidence in [0, 1], independent of the horizon.
    fn confidence(&self) -> f64;
}

/// Blend weights for (linear, arima, pattern), chosen by point count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub linear: f64,
    pub arima: f64,
    pub pattern: f64,
}

impl EnsembleWeights {
    pub fn for_points(n: usize) -> Self {
        let (linear, arima, pattern) = match n {
            n if n >= 30 => (0.2, 0.5, 0.3),
            n if n >= 14 => (0.3, 0.3, 0.4),
            n if n >= 7 => (0.6, 0.2, 0.2),
            _ => (0.8, 0.1, 0.1),
        };
        Self {
            linear,
            arima,
            pattern,
        }
    }

    pub fn weight(&self, kind: EstimatorKind) -> f64 {
        match kind {
            EstimatorKind::Linear => self.linear,
            EstimatorKind::Arima => self.arima,
            EstimatorKind::Pattern => self.pattern,
        }
    }
}

/// One estimator's contribution to an ensemble prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelForecast {
    pub model: EstimatorKind,
    pub weight: f64,
    pub value: f64,
    pub confidence: f64,
}

/// Ensemble prediction at one horizon. `value` and every component value are
/// within [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleForecast {
    pub horizon_days: f64,
    pub value: f64,
    pub confidence: f64,
    pub components: Vec<ModelForecast>,
}

impl EnsembleForecast {
    fn degenerate(horizon_days: f64) -> Self {
        Self {
            horizon_days,
            value: 0.0,
            confidence: 0.0,
            components: Vec::new(),
        }
    }
}

/// The forecast block of a trend analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub next_7_days: f64,
    pub next_30_days: f64,
    pub confidence: f64,
    pub weights: EnsembleWeights,
}

impl ForecastSummary {
    pub fn degenerate() -> Self {
        Self {
            next_7_days: 0.0,
            next_30_days: 0.0,
            confidence: 0.0,
            weights: EnsembleWeights::for_points(0),
        }
    }
}

pub(crate) struct Ensemble {
    weights: EnsembleWeights,
    estimators: [Box<dyn Estimator>; 3],
}

impl Ensemble {
    pub(crate) fn new(series: &Series, fit: LinearFit) -> Self {
        Self {
            weights: EnsembleWeights::for_points(series.len()),
            estimators: [
                Box::new(LinearEstimator::new(series, fit)),
                Box::new(ArimaEstimator::new(series)),
                Box::new(PatternEstimator::new(series, fit)),
            ],
        }
    }

    pub(crate) fn confidence(&self) -> f64 {
        let mean = self.estimators.iter().map(|e| e.confidence()).sum::<f64>()
            / self.estimators.len() as f64;
        round_to((mean * FORECAST_DISCOUNT).clamp(0.0, 1.0), 4)
    }

    pub(crate) fn forecast(&self, horizon_days: f64) -> EnsembleForecast {
        let components: Vec<ModelForecast> = self
            .estimators
            .iter()
            .map(|e| ModelForecast {
                model: e.kind(),
                weight: self.weights.weight(e.kind()),
                value: round_to(clamp_score(e.predict(horizon_days)), 2),
                confidence: round_to(e.confidence(), 4),
            })
            .collect();
        let blended: f64 = components.iter().map(|c| c.weight * c.value).sum();
        EnsembleForecast {
            horizon_days,
            value: round_to(clamp_score(blended), 2),
            confidence: self.confidence(),
            components,
        }
    }

    pub(crate) fn summary(&self) -> ForecastSummary {
        ForecastSummary {
            next_7_days: self.forecast(7.0).value,
            next_30_days: self.forecast(30.0).value,
            confidence: self.confidence(),
            weights: self.weights,
        }
    }
}

/// Ensemble prediction `horizon_days` past the last point of `history`.
///
/// With fewer than two points the result is all zeros.
pub fn ensemble_forecast(history: &[ScoreHistoryPoint], horizon_days: f64) -> EnsembleForecast {
    if history.len() < 2 {
        return EnsembleForecast::degenerate(horizon_days);
    }
    let series = Series::from_history(history);
    let fit = LinearFit::fit(&series.xs, &series.ys);
    Ensemble::new(&series, fit).forecast(horizon_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityId;
    use chrono::{Duration, TimeZone, Utc};

    fn daily(scores: &[f64]) -> Vec<ScoreHistoryPoint> {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                ScoreHistoryPoint::new(EntityId::new("e"), t0 + Duration::days(i as i64), *s)
            })
            .collect()
    }

    #[test]
    fn weights_follow_point_count() {
        assert_eq!(EnsembleWeights::for_points(3).linear, 0.8);
        assert_eq!(EnsembleWeights::for_points(7).linear, 0.6);
        assert_eq!(EnsembleWeights::for_points(14).pattern, 0.4);
        assert_eq!(EnsembleWeights::for_points(29).pattern, 0.4);
        assert_eq!(EnsembleWeights::for_points(30).arima, 0.5);
        for n in [0, 7, 14, 30] {
            let w = EnsembleWeights::for_points(n);
            assert!((w.linear + w.arima + w.pattern - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn steep_climb_is_clamped() {
        let history = daily(&[60.0, 75.0, 90.0, 99.0]);
        let f = ensemble_forecast(&history, 30.0);
        assert!(f.value <= 100.0);
        assert!(f.components.iter().all(|c| c.value <= 100.0));
    }

    #[test]
    fn steep_drop_is_clamped() {
        let history = daily(&[40.0, 25.0, 10.0, 2.0]);
        let f = ensemble_forecast(&history, 30.0);
        assert!(f.value >= 0.0);
        assert!(f.components.iter().all(|c| c.value >= 0.0));
    }

    #[test]
    fn flat_series_forecasts_flat() {
        let history = daily(&[55.0; 10]);
        let f = ensemble_forecast(&history, 7.0);
        assert!((f.value - 55.0).abs() < 1e-9);
    }

    #[test]
    fn too_short_is_zero() {
        let f = ensemble_forecast(&daily(&[70.0]), 7.0);
        assert_eq!(f.value, 0.0);
        assert_eq!(f.confidence, 0.0);
        assert!(f.components.is_empty());
    }

    #[test]
    fn confidence_is_discounted() {
        let history = daily(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]);
        let f = ensemble_forecast(&history, 7.0);
        assert!(f.confidence <= FORECAST_DISCOUNT);
        assert!(f.confidence > 0.0);
    }
}
