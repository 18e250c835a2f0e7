use chrono::{DateTime, Datelike, Duration, Utc};

use super::{Estimator, EstimatorKind};
use crate::trend::regression::LinearFit;
use crate::trend::series::{mean, std_dev, Series};

/// Number of trailing points averaged for the level component.
pub const LOOKBACK: usize = 7;

/// Blend of (linear continuation, seasonal level, plain level).
pub const PATTERN_BLEND: (f64, f64, f64) = (0.4, 0.3, 0.3);

const SEASONAL_MIN_POINTS: usize = 7;
const COVERAGE_POINTS: f64 = 14.0;

/// Pattern-based estimator: trend continuation plus a weekly seasonal offset
/// around the recent level.
#[derive(Debug, Clone)]
pub struct PatternEstimator {
    fit: LinearFit,
    last_x: f64,
    last_timestamp: Option<DateTime<Utc>>,
    lookback_mean: f64,
    /// Per-weekday mean minus overall mean, indexed Monday = 0.
    weekday_offsets: Option<[Option<f64>; 7]>,
    confidence: f64,
}

impl PatternEstimator {
    pub fn new(series: &Series, fit: LinearFit) -> Self {
        let n = series.len();
        let tail = &series.ys[n.saturating_sub(LOOKBACK)..];
        let lookback_mean = mean(tail);
        let stability = 1.0 / (1.0 + std_dev(tail));
        let coverage = (n as f64 / COVERAGE_POINTS).min(1.0);
        let confidence = 0.4 * fit.r2 + 0.3 * stability + 0.3 * coverage;

        Self {
            fit,
            last_x: series.last_x(),
            last_timestamp: series.timestamps.last().copied(),
            lookback_mean,
            weekday_offsets: weekday_offsets(series),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    fn seasonal_offset(&self, horizon_days: f64) -> f64 {
        let (Some(offsets), Some(last)) = (self.weekday_offsets, self.last_timestamp) else {
            return 0.0;
        };
        let target = last + Duration::seconds((horizon_days * 86_400.0).round() as i64);
        let idx = target.weekday().num_days_from_monday() as usize;
        offsets[idx].unwrap_or(0.0)
    }
}

impl Estimator for PatternEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Pattern
    }

    fn predict(&self, horizon_days: f64) -> f64 {
        let (w_trend, w_seasonal, w_level) = PATTERN_BLEND;
        let trend = self.fit.predict(self.last_x + horizon_days);
        let seasonal = self.lookback_mean + self.seasonal_offset(horizon_days);
        w_trend * trend + w_seasonal * seasonal + w_level * self.lookback_mean
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }
}

fn weekday_offsets(series: &Series) -> Option<[Option<f64>; 7]> {
    if series.len() < SEASONAL_MIN_POINTS {
        return None;
    }
    let overall = mean(&series.ys);
    let mut sums = [0.0_f64; 7];
    let mut counts = [0_usize; 7];
    for (ts, y) in series.timestamps.iter().zip(&series.ys) {
        let idx = ts.weekday().num_days_from_monday() as usize;
        sums[idx] += y;
        counts[idx] += 1;
    }
    let mut offsets = [None; 7];
    for idx in 0..7 {
        if counts[idx] > 0 {
            offsets[idx] = Some(sums[idx] / counts[idx] as f64 - overall);
        }
    }
    Some(offsets)
}
