use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::rules::{total_adjustment, AdjustmentRule, DEFAULT_MAX_ADJUSTMENT};
use super::weights::WeightTable;
use crate::domain::{clamp_score, round_to, Category, CompositeScore, SignalBundle};
use crate::error::ScoreError;

/// Weights and adjustment rules for one pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryModel {
    pub category: Category,
    pub weights: WeightTable,
    #[serde(default)]
    pub rules: Vec<AdjustmentRule>,
    #[serde(default = "default_max_adjustment")]
    pub max_adjustment: f64,
}

fn default_max_adjustment() -> f64 {
    DEFAULT_MAX_ADJUSTMENT
}

impl CategoryModel {
    pub fn default_for(category: Category) -> Self {
        Self {
            category,
            weights: WeightTable::default_for(category),
            rules: AdjustmentRule::default_rules(category),
            max_adjustment: DEFAULT_MAX_ADJUSTMENT,
        }
    }

    pub fn validate(&self) -> Result<(), ScoreError> {
        self.weights.validate(self.category.as_str())?;
        if !self.max_adjustment.is_finite() || self.max_adjustment < 0.0 {
            return Err(ScoreError::Configuration(format!(
                "{}: max_adjustment must be non-negative, got {}",
                self.category, self.max_adjustment
            )));
        }
        Ok(())
    }

    /// Score a bundle: weighted sum of required sub-metrics plus the bounded
    /// adjustment, clamped to [0, 100] and rounded to 2 decimals.
    pub fn score(&self, signals: &SignalBundle) -> Result<CompositeScore, ScoreError> {
        self.validate()?;

        let mut breakdown = BTreeMap::new();
        let mut weighted_sum = 0.0;
        for (metric, weight) in self.weights.iter() {
            let value = signals.get(metric).ok_or_else(|| ScoreError::MissingSignal {
                category: self.category,
                metric: metric.to_string(),
            })?;
            if !value.is_finite() {
                return Err(ScoreError::NonFiniteSignal {
                    category: self.category,
                    metric: metric.to_string(),
                });
            }
            let contribution = value * weight;
            weighted_sum += contribution;
            breakdown.insert(metric.to_string(), round_to(contribution, 4));
        }

        let adjustment = total_adjustment(&self.rules, signals, self.max_adjustment);
        let value = round_to(clamp_score(weighted_sum + adjustment), 2);

        Ok(CompositeScore {
            entity_id: signals.entity_id.clone(),
            category: self.category,
            value,
            breakdown,
            adjustment,
            computed_at: signals.collected_at,
        })
    }
}

/// Score one category with the given weights and that category's default rules.
pub fn score(
    category: Category,
    signals: &SignalBundle,
    weights: &WeightTable,
) -> Result<CompositeScore, ScoreError> {
    CategoryModel {
        category,
        weights: weights.clone(),
        rules: AdjustmentRule::default_rules(category),
        max_adjustment: DEFAULT_MAX_ADJUSTMENT,
    }
    .score(signals)
}
