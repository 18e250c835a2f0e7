use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::CardKind;

/// A user's past triage behavior.
///
/// `action_frequency` is keyed by card kind or level name (`"incident"`,
/// `"critical"`); `avg_response_time` by kind, in minutes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserHistory {
    #[serde(default)]
    pub action_frequency: BTreeMap<String, u32>,
    #[serde(default)]
    pub avg_response_time: BTreeMap<String, f64>,
    #[serde(default)]
    pub preferred_actions: Vec<String>,
}

impl UserHistory {
    pub fn frequency(&self, key: &str) -> u32 {
        self.action_frequency.get(key).copied().unwrap_or(0)
    }

    /// Average response time for `kind`, ignoring unusable entries.
    pub fn avg_response_minutes(&self, kind: CardKind) -> Option<f64> {
        self.avg_response_time
            .get(kind.as_str())
            .copied()
            .filter(|m| m.is_finite() && *m > 0.0)
    }
}
