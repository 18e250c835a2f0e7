//! Aggregate formula across pillars, with optional geographic pooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::weights::WeightTable;
use crate::domain::{clamp_score, round_to, Category, CompositeScore, EntityId};
use crate::error::ScoreError;

pub const POOL_SELF_WEIGHT: f64 = 0.7;
pub const POOL_PEER_WEIGHT: f64 = 0.3;

/// Pooling mode. Always passed explicitly; never inferred from the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pooling {
    None,
    /// Blend `0.7 × self + 0.3 × peer_mean`.
    Geographic { peer_mean: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    pub entity_id: EntityId,
    pub value: f64,
    /// Weighted pillar sum before pooling.
    pub self_value: f64,
    pub by_category: BTreeMap<String, f64>,
    pub pooled: bool,
    pub computed_at: DateTime<Utc>,
}

/// `aggregate = Σ(category_score × category_weight)`, optionally pooled.
///
/// `weights` is keyed by category name and must sum to 1.0.
pub fn aggregate(
    entity_id: &EntityId,
    scores: &[CompositeScore],
    weights: &WeightTable,
    pooling: Pooling,
) -> Result<AggregateScore, ScoreError> {
    weights.validate("aggregate")?;

    let mut by_category = BTreeMap::new();
    let mut total = 0.0;
    for (name, weight) in weights.iter() {
        let category = Category::parse(name).ok_or_else(|| {
            ScoreError::Configuration(format!("aggregate: unknown category '{name}'"))
        })?;
        let score = scores
            .iter()
            .find(|s| s.category == category)
            .ok_or(ScoreError::MissingCategory(category))?;
        by_category.insert(name.to_string(), score.value);
        total += score.value * weight;
    }

    let self_value = clamp_score(total);
    let value = match pooling {
        Pooling::None => self_value,
        Pooling::Geographic { peer_mean } => {
            if !peer_mean.is_finite() {
                return Err(ScoreError::Configuration(format!(
                    "geographic pooling: peer mean is not finite ({peer_mean})"
                )));
            }
            POOL_SELF_WEIGHT * self_value + POOL_PEER_WEIGHT * clamp_score(peer_mean)
        }
    };

    let computed_at = scores
        .iter()
        .map(|s| s.computed_at)
        .max()
        .unwrap_or_default();

    Ok(AggregateScore {
        entity_id: entity_id.clone(),
        value: round_to(clamp_score(value), 2),
        self_value: round_to(self_value, 2),
        by_category,
        pooled: matches!(pooling, Pooling::Geographic { .. }),
        computed_at,
    })
}
