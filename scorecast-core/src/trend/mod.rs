//! Trend & forecast engine.
//!
//! Velocity is the OLS slope of score vs. elapsed days, confidence is its R²,
//! acceleration compares the two halves of the series. Forecasts blend three
//! lightweight estimators (linear, ARIMA-like, pattern-based) with weights
//! that depend on how much history exists. Every forecast is clamped to
//! [0, 100].

pub mod analysis;
pub mod forecast;
pub mod regression;
pub mod series;

pub use analysis::{
    analyze_trend, Direction, SignalDelta, SignalTrends, TrendAnalysis, DIRECTION_THRESHOLD,
};
pub use forecast::{
    ensemble_forecast, EnsembleForecast, EnsembleWeights, EstimatorKind, ForecastSummary,
    ModelForecast, FORECAST_DISCOUNT,
};
pub use regression::LinearFit;
pub use series::Series;
