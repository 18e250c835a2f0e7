//! Batch fixtures — a JSON description of entities, signals, history and
//! events, loaded into in-memory collaborators.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scorecast_core::domain::{
    Category, EntityId, HistoricalImpact, MarketEvent, ScoreHistoryPoint, SignalBundle,
};
use scorecast_core::error::SourceError;
use scorecast_core::scoring::Pooling;
use scorecast_core::sources::{
    EventStore, HistoryStore, InMemoryEventStore, InMemoryForecastStore, InMemoryHistoryStore,
    InMemorySignalSource, InMemoryUserHistory, InMemoryVarianceLedger,
};
use scorecast_core::triage::UserHistory;

use crate::pipeline::{Collaborators, EntityTarget};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFixture {
    pub entity_id: EntityId,
    #[serde(default = "no_pooling")]
    pub pooling: Pooling,
    /// Raw sub-metrics per pillar.
    #[serde(default)]
    pub signals: BTreeMap<Category, BTreeMap<String, f64>>,
    #[serde(default)]
    pub history: Vec<ScoreHistoryPoint>,
    #[serde(default)]
    pub impacts: Vec<HistoricalImpact>,
    /// Latest aggregate score per tracked competitor.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub competitors: BTreeMap<String, f64>,
    /// Simulated upstream failure message for every signal fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_with: Option<String>,
}

fn no_pooling() -> Pooling {
    Pooling::None
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchFixture {
    pub entities: Vec<EntityFixture>,
    #[serde(default)]
    pub events: Vec<MarketEvent>,
    #[serde(default)]
    pub users: BTreeMap<String, UserHistory>,
}

impl BatchFixture {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse batch fixture JSON")
    }

    /// Entity targets in fixture order.
    pub fn targets(&self) -> Vec<EntityTarget> {
        self.entities
            .iter()
            .map(|e| EntityTarget {
                entity_id: e.entity_id.clone(),
                pooling: e.pooling,
            })
            .collect()
    }

    /// Load everything into fresh in-memory collaborators. Signal bundles
    /// are stamped `collected_at`.
    pub fn collaborators(&self, collected_at: DateTime<Utc>) -> Result<Collaborators> {
        let signals = InMemorySignalSource::new();
        let history = InMemoryHistoryStore::new();
        let events = InMemoryEventStore::new();
        let users = InMemoryUserHistory::new();

        for entity in &self.entities {
            for (category, metrics) in &entity.signals {
                let mut bundle =
                    SignalBundle::new(entity.entity_id.clone(), *category, collected_at);
                bundle.metrics = metrics.clone();
                signals.insert(bundle)?;
            }
            if !entity.competitors.is_empty() {
                signals.set_competitors(entity.entity_id.clone(), entity.competitors.clone())?;
            }
            if let Some(message) = &entity.fail_with {
                signals.fail(
                    entity.entity_id.clone(),
                    SourceError::Upstream {
                        status: 503,
                        message: message.clone(),
                    },
                )?;
            }
            for point in &entity.history {
                history.append(point)?;
            }
            events.add_impacts(entity.entity_id.clone(), entity.impacts.iter().cloned())?;
        }
        for event in &self.events {
            events.append(event.clone())?;
        }
        for (user_id, h) in &self.users {
            users.insert(user_id, h.clone())?;
        }

        Ok(Collaborators {
            signals: Arc::new(signals),
            history: Arc::new(history),
            events: Arc::new(events),
            forecasts: Arc::new(InMemoryForecastStore::new()),
            ledger: Arc::new(InMemoryVarianceLedger::new()),
            users: Arc::new(users),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorecast_core::sources::{SignalSource, UserHistoryProvider};

    const FIXTURE: &str = r#"{
        "entities": [
            {
                "entity_id": "loc-1",
                "pooling": { "mode": "geographic", "peer_mean": 60.0 },
                "signals": { "perception": { "sentiment": 70.0 } },
                "impacts": [
                    { "pillar": "perception", "impact": 0.4, "event_type": "industry_trend" }
                ],
                "competitors": { "rival": 82.5 }
            },
            { "entity_id": "loc-2", "fail_with": "gateway timeout" }
        ],
        "users": { "analyst": { "preferred_actions": ["respond to review"] } }
    }"#;

    #[test]
    fn parses_and_builds_targets() {
        let fixture = BatchFixture::from_json(FIXTURE).unwrap();
        let targets = fixture.targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].pooling, Pooling::Geographic { peer_mean: 60.0 });
        assert_eq!(targets[1].pooling, Pooling::None);
    }

    #[test]
    fn peer_mean_alone_does_not_pool() {
        let fixture = BatchFixture::from_json(
            r#"{ "entities": [ { "entity_id": "loc-3", "peer_mean": 60.0 } ] }"#,
        )
        .unwrap();
        assert_eq!(fixture.targets()[0].pooling, Pooling::None);
    }

    #[test]
    fn explicit_none_pooling_parses() {
        let fixture = BatchFixture::from_json(
            r#"{ "entities": [ { "entity_id": "loc-3", "pooling": { "mode": "none" } } ] }"#,
        )
        .unwrap();
        assert_eq!(fixture.entities[0].pooling, Pooling::None);
    }

    #[test]
    fn loads_into_collaborators() {
        let fixture = BatchFixture::from_json(FIXTURE).unwrap();
        let io = fixture.collaborators(Utc::now()).unwrap();
        let bundle = io
            .signals
            .get_signals(&EntityId::new("loc-1"), Category::Perception)
            .unwrap();
        assert_eq!(bundle.get("sentiment"), Some(70.0));
        assert!(io.signals.get_signals(&EntityId::new("loc-2"), Category::Perception).is_err());
        assert_eq!(io.events.historical_impacts(&EntityId::new("loc-1")).unwrap().len(), 1);
        let rivals = io.signals.competitor_scores(&EntityId::new("loc-1")).unwrap();
        assert_eq!(rivals.get("rival"), Some(&82.5));
        assert_eq!(
            io.users.get_history("analyst").unwrap().preferred_actions,
            vec!["respond to review".to_string()]
        );
    }
}
