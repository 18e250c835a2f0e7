//! Market-event impact forecasting.
//!
//! Elasticities are derived per call from historical observations; nothing
//! here reads a clock or writes state. The caller persists the resulting
//! [`ImpactForecast`].

pub mod actions;
pub mod competitor;
pub mod elasticity;
pub mod forecaster;
pub mod radar;

pub use actions::{estimate_action_impact, ActionImpactEstimate};
pub use competitor::{forecast_competitor_gaps, CompetitorGap, GapRisk, GAP_GROWTH};
pub use elasticity::{derive_elasticities, ElasticityCoefficient};
pub use forecaster::{
    forecast_impact, recommended_actions, ActionPlan, Baseline, ForecastedImpact, ImpactForecast,
    ACTION_COMPETITOR_REVIEW, ACTION_SCHEMA_AUDIT, CONFIDENCE_FLOOR, FOCUS_BETA_THRESHOLD,
};
pub use radar::{radar, RadarSummary};
