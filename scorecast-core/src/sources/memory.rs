//! `RwLock`-backed in-memory collaborators for tests, fixtures and the CLI.

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};

use super::{
    EventStore, ForecastStore, HistoryStore, SignalSource, UserHistoryProvider, VarianceLedger,
};
use crate::domain::{
    Category, EntityId, HistoricalImpact, MarketEvent, ScoreHistoryPoint, SignalBundle,
};
use crate::error::{SourceError, StoreError};
use crate::impact::ImpactForecast;
use crate::triage::UserHistory;

/// Signal bundles keyed by (entity, category), with optional injected failures.
#[derive(Debug, Default)]
pub struct InMemorySignalSource {
    bundles: RwLock<BTreeMap<(EntityId, Category), SignalBundle>>,
    failures: RwLock<BTreeMap<EntityId, SourceError>>,
    competitors: RwLock<BTreeMap<EntityId, BTreeMap<String, f64>>>,
}

impl InMemorySignalSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bundle: SignalBundle) -> Result<(), StoreError> {
        let mut map = self.bundles.write().map_err(|_| StoreError::Poisoned)?;
        map.insert((bundle.entity_id.clone(), bundle.category), bundle);
        Ok(())
    }

    /// Every subsequent fetch for `entity` fails with `error`.
    pub fn fail(&self, entity: EntityId, error: SourceError) -> Result<(), StoreError> {
        let mut map = self.failures.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(entity, error);
        Ok(())
    }

    pub fn set_competitors(
        &self,
        entity: EntityId,
        scores: BTreeMap<String, f64>,
    ) -> Result<(), StoreError> {
        let mut map = self.competitors.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(entity, scores);
        Ok(())
    }

    fn injected_failure(&self, entity: &EntityId) -> Option<SourceError> {
        self.failures.read().ok()?.get(entity).cloned()
    }
}

impl SignalSource for InMemorySignalSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_signals(
        &self,
        entity: &EntityId,
        category: Category,
    ) -> Result<SignalBundle, SourceError> {
        if let Some(err) = self.injected_failure(entity) {
            return Err(err);
        }
        let not_found = || SourceError::NotFound {
            entity: entity.to_string(),
            category,
        };
        let bundles = self.bundles.read().map_err(|_| not_found())?;
        bundles
            .get(&(entity.clone(), category))
            .cloned()
            .ok_or_else(not_found)
    }

    fn competitor_scores(&self, entity: &EntityId) -> Result<BTreeMap<String, f64>, SourceError> {
        if let Some(err) = self.injected_failure(entity) {
            return Err(err);
        }
        Ok(self
            .competitors
            .read()
            .ok()
            .and_then(|map| map.get(entity).cloned())
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    points: RwLock<BTreeMap<EntityId, Vec<ScoreHistoryPoint>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn append(&self, point: &ScoreHistoryPoint) -> Result<(), StoreError> {
        let mut map = self.points.write().map_err(|_| StoreError::Poisoned)?;
        map.entry(point.entity_id.clone()).or_default().push(point.clone());
        Ok(())
    }

    fn read(
        &self,
        entity: &EntityId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ScoreHistoryPoint>, StoreError> {
        let map = self.points.read().map_err(|_| StoreError::Poisoned)?;
        let mut points: Vec<ScoreHistoryPoint> = map
            .get(entity)
            .map(|pts| {
                pts.iter()
                    .filter(|p| since.map_or(true, |s| p.timestamp >= s))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<MarketEvent>>,
    impacts: RwLock<BTreeMap<EntityId, Vec<HistoricalImpact>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_impacts(
        &self,
        entity: EntityId,
        impacts: impl IntoIterator<Item = HistoricalImpact>,
    ) -> Result<(), StoreError> {
        let mut map = self.impacts.write().map_err(|_| StoreError::Poisoned)?;
        map.entry(entity).or_default().extend(impacts);
        Ok(())
    }
}

impl EventStore for InMemoryEventStore {
    fn append(&self, event: MarketEvent) -> Result<(), StoreError> {
        let mut events = self.events.write().map_err(|_| StoreError::Poisoned)?;
        events.push(event);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<MarketEvent>, StoreError> {
        let events = self.events.read().map_err(|_| StoreError::Poisoned)?;
        let mut recent = events.clone();
        recent.sort_by(|a, b| b.detected_at.cmp(&a.detected_at).then_with(|| a.id.cmp(&b.id)));
        recent.truncate(limit);
        Ok(recent)
    }

    fn historical_impacts(&self, entity: &EntityId) -> Result<Vec<HistoricalImpact>, StoreError> {
        let map = self.impacts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(entity).cloned().unwrap_or_default())
    }
}

/// User histories by id; unknown users have an empty history.
#[derive(Debug, Default)]
pub struct InMemoryUserHistory {
    users: RwLock<BTreeMap<String, UserHistory>>,
}

impl InMemoryUserHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: &str, history: UserHistory) -> Result<(), StoreError> {
        let mut map = self.users.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(user_id.to_string(), history);
        Ok(())
    }
}

impl UserHistoryProvider for InMemoryUserHistory {
    fn get_history(&self, user_id: &str) -> Result<UserHistory, StoreError> {
        let map = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(user_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryForecastStore {
    forecasts: RwLock<BTreeMap<EntityId, Vec<ImpactForecast>>>,
}

impl InMemoryForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forecasts
            .read()
            .map(|m| m.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ForecastStore for InMemoryForecastStore {
    fn save(&self, forecast: &ImpactForecast) -> Result<(), StoreError> {
        let mut map = self.forecasts.write().map_err(|_| StoreError::Poisoned)?;
        map.entry(forecast.entity_id.clone())
            .or_default()
            .push(forecast.clone());
        Ok(())
    }

    fn for_entity(&self, entity: &EntityId) -> Result<Vec<ImpactForecast>, StoreError> {
        let map = self.forecasts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(entity).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryVarianceLedger {
    applied: RwLock<BTreeMap<EntityId, NaiveDate>>,
}

impl InMemoryVarianceLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VarianceLedger for InMemoryVarianceLedger {
    fn last_applied(&self, entity: &EntityId) -> Result<Option<NaiveDate>, StoreError> {
        let map = self.applied.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(entity).copied())
    }

    fn mark_applied(&self, entity: &EntityId, date: NaiveDate) -> Result<(), StoreError> {
        let mut map = self.applied.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(entity.clone(), date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventId, EventType, Severity};
    use chrono::{Duration, TimeZone};

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn signal_source_lookup_and_failure() {
        let src = InMemorySignalSource::new();
        let e = EntityId::new("loc-1");
        src.insert(SignalBundle::new(e.clone(), Category::Perception, t(1)).with("sentiment", 80.0))
            .unwrap();
        assert!(src.get_signals(&e, Category::Perception).is_ok());
        assert!(matches!(
            src.get_signals(&e, Category::PageQuality),
            Err(SourceError::NotFound { .. })
        ));
        src.fail(e.clone(), SourceError::Timeout(500)).unwrap();
        assert_eq!(src.get_signals(&e, Category::Perception), Err(SourceError::Timeout(500)));
    }

    #[test]
    fn competitor_scores_default_to_none() {
        let src = InMemorySignalSource::new();
        let e = EntityId::new("loc-1");
        assert!(src.competitor_scores(&e).unwrap().is_empty());

        let rivals = BTreeMap::from([("rival-a".to_string(), 82.0)]);
        src.set_competitors(e.clone(), rivals.clone()).unwrap();
        assert_eq!(src.competitor_scores(&e).unwrap(), rivals);
    }

    #[test]
    fn history_reads_are_ordered_and_windowed() {
        let store = InMemoryHistoryStore::new();
        let e = EntityId::new("loc-1");
        for day in [3, 1, 2] {
            store.append(&ScoreHistoryPoint::new(e.clone(), t(day), day as f64)).unwrap();
        }
        let all = store.read(&e, None).unwrap();
        assert_eq!(all.iter().map(|p| p.score).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
        assert_eq!(store.read(&e, Some(t(2))).unwrap().len(), 2);
        assert!(store.read(&EntityId::new("other"), None).unwrap().is_empty());
    }

    #[test]
    fn recent_events_newest_first() {
        let store = InMemoryEventStore::new();
        for (id, offset) in [("a", 0), ("b", 2), ("c", 1)] {
            store
                .append(MarketEvent {
                    id: EventId::new(id),
                    event_type: EventType::IndustryTrend,
                    severity: Severity::Low,
                    detected_at: t(1) + Duration::hours(offset),
                    affected_entities: None,
                    metadata: BTreeMap::new(),
                })
                .unwrap();
        }
        let ids: Vec<_> = store.recent(2).unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![EventId::new("b"), EventId::new("c")]);
    }

    #[test]
    fn unknown_user_has_empty_history() {
        let users = InMemoryUserHistory::new();
        assert_eq!(users.get_history("nobody").unwrap(), UserHistory::default());
    }

    #[test]
    fn ledger_round_trip() {
        let ledger = InMemoryVarianceLedger::new();
        let e = EntityId::new("loc-1");
        assert_eq!(ledger.last_applied(&e).unwrap(), None);
        let day = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        ledger.mark_applied(&e, day).unwrap();
        assert_eq!(ledger.last_applied(&e).unwrap(), Some(day));
    }
}
