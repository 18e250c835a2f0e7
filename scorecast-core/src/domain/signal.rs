//! Signal bundles — immutable per-entity, per-category scorer inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ids::EntityId;

/// The four QAI pillars a composite score is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PageQuality,
    Perception,
    VoiceStructure,
    CitationIndex,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::PageQuality,
        Category::Perception,
        Category::VoiceStructure,
        Category::CitationIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageQuality => "page_quality",
            Self::Perception => "perception",
            Self::VoiceStructure => "voice_structure",
            Self::CitationIndex => "citation_index",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw sub-metrics for one entity and one category.
///
/// Sub-metrics are typically on a 0–100 scale. Auxiliary metrics that feed
/// only adjustment rules (e.g. `word_count`) may use their natural units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBundle {
    pub entity_id: EntityId,
    pub category: Category,
    pub collected_at: DateTime<Utc>,
    pub metrics: BTreeMap<String, f64>,
}

impl SignalBundle {
    pub fn new(entity_id: EntityId, category: Category, collected_at: DateTime<Utc>) -> Self {
        Self {
            entity_id,
            category,
            collected_at,
            metrics: BTreeMap::new(),
        }
    }

    /// Builder-style metric insertion, used by adapters and fixtures.
    pub fn with(mut self, metric: &str, value: f64) -> Self {
        self.metrics.insert(metric.to_string(), value);
        self
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names_roundtrip() {
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_str()), Some(c));
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.as_str()));
        }
        assert_eq!(Category::parse("weather"), None);
    }
}
