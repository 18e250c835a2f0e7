use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Category;
use crate::error::ScoreError;

/// Allowed deviation of a weight table's sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Named weights that must sum to 1.0.
///
/// Keyed by sub-metric name for category scoring, or by category name for
/// the aggregate formula. `BTreeMap` keeps iteration (and therefore float
/// summation order) deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable(pub BTreeMap<String, f64>);

impl WeightTable {
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    /// Reject empty tables, negative or non-finite weights, and sums off 1.0.
    pub fn validate(&self, label: &str) -> Result<(), ScoreError> {
        if self.0.is_empty() {
            return Err(ScoreError::Configuration(format!("{label}: weight table is empty")));
        }
        for (key, w) in &self.0 {
            if !w.is_finite() || *w < 0.0 {
                return Err(ScoreError::Configuration(format!(
                    "{label}: weight for '{key}' must be a non-negative number, got {w}"
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ScoreError::Configuration(format!(
                "{label}: weights sum to {sum}, expected 1.0"
            )));
        }
        Ok(())
    }

    /// Default sub-metric weights for a QAI pillar.
    pub fn default_for(category: Category) -> Self {
        match category {
            Category::PageQuality => Self::from_pairs(&[
                ("content_depth", 0.30),
                ("page_speed", 0.25),
                ("mobile_usability", 0.20),
                ("technical_health", 0.25),
            ]),
            Category::Perception => Self::from_pairs(&[
                ("sentiment", 0.35),
                ("readability", 0.25),
                ("review_rating", 0.25),
                ("review_response_rate", 0.15),
            ]),
            Category::VoiceStructure => Self::from_pairs(&[
                ("schema_coverage", 0.35),
                ("faq_coverage", 0.25),
                ("answer_completeness", 0.20),
                ("entity_recognition", 0.20),
            ]),
            Category::CitationIndex => Self::from_pairs(&[
                ("citation_frequency", 0.35),
                ("source_authority", 0.25),
                ("nap_consistency", 0.20),
                ("multi_platform_presence", 0.15),
                ("sentiment_quality", 0.05),
            ]),
        }
    }

    /// Equal pillar weights for the aggregate formula.
    pub fn default_aggregate() -> Self {
        Self(
            Category::ALL
                .iter()
                .map(|c| (c.as_str().to_string(), 0.25))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        for c in Category::ALL {
            WeightTable::default_for(c).validate(c.as_str()).unwrap();
        }
        WeightTable::default_aggregate().validate("aggregate").unwrap();
    }

    #[test]
    fn sum_outside_tolerance_is_configuration_error() {
        let t = WeightTable::from_pairs(&[("a", 0.5), ("b", 0.49)]);
        let err = t.validate("test").unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("sum to"));
    }

    #[test]
    fn sum_within_tolerance_is_accepted() {
        let t = WeightTable::from_pairs(&[("a", 0.1), ("b", 0.2), ("c", 0.7000000001)]);
        assert!(t.validate("test").is_ok());
    }

    #[test]
    fn negative_and_nan_weights_rejected() {
        let neg = WeightTable::from_pairs(&[("a", 1.5), ("b", -0.5)]);
        assert!(neg.validate("neg").is_err());
        let nan = WeightTable::from_pairs(&[("a", f64::NAN)]);
        assert!(nan.validate("nan").is_err());
        assert!(WeightTable(BTreeMap::new()).validate("empty").is_err());
    }
}
