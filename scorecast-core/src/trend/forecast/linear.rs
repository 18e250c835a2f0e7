use super::{Estimator, EstimatorKind};
use crate::trend::regression::LinearFit;
use crate::trend::series::Series;

/// OLS extrapolation; confidence is the fit's R².
#[derive(Debug, Clone)]
pub struct LinearEstimator {
    fit: LinearFit,
    last_x: f64,
}

impl LinearEstimator {
    pub fn new(series: &Series, fit: LinearFit) -> Self {
        Self {
            fit,
            last_x: series.last_x(),
        }
    }
}

impl Estimator for LinearEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::Linear
    }

    fn predict(&self, horizon_days: f64) -> f64 {
        self.fit.predict(self.last_x + horizon_days)
    }

    fn confidence(&self) -> f64 {
        self.fit.r2
    }
}
