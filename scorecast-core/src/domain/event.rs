//! Market events and historical impact observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::ids::{EntityId, EventId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AlgorithmUpdate,
    PlatformPolicyChange,
    CompetitorAction,
    IndustryTrend,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::AlgorithmUpdate,
        EventType::PlatformPolicyChange,
        EventType::CompetitorAction,
        EventType::IndustryTrend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlgorithmUpdate => "algorithm_update",
            Self::PlatformPolicyChange => "platform_policy_change",
            Self::CompetitorAction => "competitor_action",
            Self::IndustryTrend => "industry_trend",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Fixed base impact in score points.
    pub fn base_impact(&self) -> f64 {
        match self {
            Self::Low => -1.0,
            Self::Medium => -3.0,
            Self::High => -7.0,
            Self::Critical => -15.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A detected market event. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
    /// `None` means the event affects every entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_entities: Option<BTreeSet<EntityId>>,
    #[serde(default)]
    pub metadata: BTreeMap<String, f64>,
}

impl MarketEvent {
    pub fn affects(&self, entity: &EntityId) -> bool {
        self.affected_entities
            .as_ref()
            .map_or(true, |set| set.contains(entity))
    }
}

/// A past observation of how a pillar reacted to an event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalImpact {
    pub pillar: String,
    pub impact: f64,
    pub event_type: EventType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn severity_table() {
        assert_eq!(Severity::Low.base_impact(), -1.0);
        assert_eq!(Severity::Medium.base_impact(), -3.0);
        assert_eq!(Severity::High.base_impact(), -7.0);
        assert_eq!(Severity::Critical.base_impact(), -15.0);
    }

    #[test]
    fn event_json_uses_type_field() {
        let event = MarketEvent {
            id: EventId::new("evt-1"),
            event_type: EventType::AlgorithmUpdate,
            severity: Severity::High,
            detected_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            affected_entities: None,
            metadata: BTreeMap::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "algorithm_update");
        assert_eq!(json["severity"], "high");
        assert!(json.get("affected_entities").is_none());
    }

    #[test]
    fn unscoped_event_affects_everyone() {
        let mut event = MarketEvent {
            id: EventId::new("evt-2"),
            event_type: EventType::CompetitorAction,
            severity: Severity::Low,
            detected_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            affected_entities: None,
            metadata: BTreeMap::new(),
        };
        assert!(event.affects(&EntityId::new("a")));

        event.affected_entities = Some([EntityId::new("b")].into_iter().collect());
        assert!(!event.affects(&EntityId::new("a")));
        assert!(event.affects(&EntityId::new("b")));
    }
}
