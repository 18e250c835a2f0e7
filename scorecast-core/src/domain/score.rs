//! Composite scores and score history points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::EntityId;
use super::signal::Category;

/// Bounded 0–100 score for one category, with its explainable breakdown.
///
/// `value == round2(clamp(Σ breakdown + adjustment))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub entity_id: EntityId,
    pub category: Category,
    pub value: f64,
    /// Weighted contribution (`signal × weight`) per sub-metric.
    pub breakdown: BTreeMap<String, f64>,
    /// Bounded threshold-rule delta applied on top of the weighted sum.
    pub adjustment: f64,
    pub computed_at: DateTime<Utc>,
}

/// One point of an entity's append-only score history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreHistoryPoint {
    pub entity_id: EntityId,
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    #[serde(default)]
    pub component_signals: BTreeMap<String, f64>,
}

impl ScoreHistoryPoint {
    pub fn new(entity_id: EntityId, timestamp: DateTime<Utc>, score: f64) -> Self {
        Self {
            entity_id,
            timestamp,
            score,
            component_signals: BTreeMap::new(),
        }
    }
}
