//! Collaborator interfaces for everything outside the pure core.
//!
//! The pipeline never performs I/O itself; it talks to these traits. All
//! methods take `&self` so one instance can be shared across worker threads.
//! Append-only: nothing here updates or deletes a stored record.

pub mod memory;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{
    Category, EntityId, HistoricalImpact, MarketEvent, ScoreHistoryPoint, SignalBundle,
};
use crate::error::{SourceError, StoreError};
use crate::impact::ImpactForecast;
use crate::triage::UserHistory;

pub use memory::{
    InMemoryEventStore, InMemoryForecastStore, InMemoryHistoryStore, InMemorySignalSource,
    InMemoryUserHistory, InMemoryVarianceLedger,
};

/// Provides raw signal bundles. May fail per entity (timeouts, upstream
/// errors); the caller skips that entity.
pub trait SignalSource: Send + Sync {
    fn name(&self) -> &str;

    fn get_signals(
        &self,
        entity: &EntityId,
        category: Category,
    ) -> Result<SignalBundle, SourceError>;

    /// Latest aggregate score per tracked competitor of `entity`. Sources
    /// without competitor coverage report none.
    fn competitor_scores(&self, _entity: &EntityId) -> Result<BTreeMap<String, f64>, SourceError> {
        Ok(BTreeMap::new())
    }
}

/// Append-only score history.
pub trait HistoryStore: Send + Sync {
    fn append(&self, point: &ScoreHistoryPoint) -> Result<(), StoreError>;

    /// Points for `entity` at or after `since`, ordered by timestamp.
    fn read(
        &self,
        entity: &EntityId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ScoreHistoryPoint>, StoreError>;
}

/// Market event log plus the historical impact observations derived from it.
pub trait EventStore: Send + Sync {
    fn append(&self, event: MarketEvent) -> Result<(), StoreError>;

    /// Up to `limit` events, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<MarketEvent>, StoreError>;

    fn historical_impacts(&self, entity: &EntityId) -> Result<Vec<HistoricalImpact>, StoreError>;
}

pub trait UserHistoryProvider: Send + Sync {
    fn get_history(&self, user_id: &str) -> Result<UserHistory, StoreError>;
}

/// Persists impact forecasts. Newer forecasts supersede older ones.
pub trait ForecastStore: Send + Sync {
    fn save(&self, forecast: &ImpactForecast) -> Result<(), StoreError>;

    fn for_entity(&self, entity: &EntityId) -> Result<Vec<ImpactForecast>, StoreError>;
}

/// Remembers the last day each entity received variance.
pub trait VarianceLedger: Send + Sync {
    fn last_applied(&self, entity: &EntityId) -> Result<Option<NaiveDate>, StoreError>;

    fn mark_applied(&self, entity: &EntityId, date: NaiveDate) -> Result<(), StoreError>;
}
