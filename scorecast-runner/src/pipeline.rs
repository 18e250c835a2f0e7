//! Batch orchestrator — one independent pass per entity, fanned out on rayon.
//!
//! Per entity: signals → pillar scores → aggregate → variance → history
//! read → history append → ledger mark → trend → competitor gaps → impact
//! forecasts. Failures are isolated to the entity and reported as
//! [`SkippedEntity`]; only configuration and the batch-level event snapshot
//! can fail the whole run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use scorecast_core::domain::{
    CardInput, CompositeScore, EntityId, MarketEvent, ModelId, PriorityCard, ScoreHistoryPoint,
};
use scorecast_core::impact::{
    forecast_competitor_gaps, forecast_impact, radar, CompetitorGap, ImpactForecast, RadarSummary,
};
use scorecast_core::scoring::{aggregate, AggregateScore, CategoryModel, Pooling};
use scorecast_core::sources::{
    EventStore, ForecastStore, HistoryStore, SignalSource, UserHistoryProvider, VarianceLedger,
};
use scorecast_core::trend::{analyze_trend, TrendAnalysis};
use scorecast_core::triage::Ranker;
use scorecast_core::variance::VarianceInjector;
use scorecast_core::StoreError;

use crate::config::{ConfigError, PipelineConfig};
use crate::triage::{run_triage, TriageReport};

/// Version of the persisted report shapes.
pub const SCHEMA_VERSION: u32 = 1;

/// Score dimension key for the aggregate in variance and history maps.
pub const AGGREGATE_KEY: &str = "aggregate";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("failed to read event snapshot: {0}")]
    EventSnapshot(StoreError),
}

/// Injected collaborators. All shared across workers.
#[derive(Clone)]
pub struct Collaborators {
    pub signals: Arc<dyn SignalSource>,
    pub history: Arc<dyn HistoryStore>,
    pub events: Arc<dyn EventStore>,
    pub forecasts: Arc<dyn ForecastStore>,
    pub ledger: Arc<dyn VarianceLedger>,
    pub users: Arc<dyn UserHistoryProvider>,
}

/// One entity to process, with its pooling mode stated explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTarget {
    pub entity_id: EntityId,
    #[serde(default = "no_pooling")]
    pub pooling: Pooling,
}

fn no_pooling() -> Pooling {
    Pooling::None
}

impl EntityTarget {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: EntityId::new(entity_id),
            pooling: Pooling::None,
        }
    }

    pub fn pooled(mut self, peer_mean: f64) -> Self {
        self.pooling = Pooling::Geographic { peer_mean };
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Signals,
    Scoring,
    Aggregate,
    HistoryRead,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Signals => "signals",
            Stage::Scoring => "scoring",
            Stage::Aggregate => "aggregate",
            Stage::HistoryRead => "history_read",
        }
    }
}

/// An entity the batch could not process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntity {
    pub entity_id: EntityId,
    pub stage: Stage,
    pub reason: String,
}

/// Everything one entity pass produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityOutcome {
    pub entity_id: EntityId,
    pub scores: Vec<CompositeScore>,
    pub aggregate: AggregateScore,
    /// Pillar and aggregate values after variance. Identical across reruns
    /// for the same day.
    pub final_scores: BTreeMap<String, f64>,
    /// True when this run recorded the day in the variance ledger; reruns
    /// for an already recorded day report false.
    pub variance_applied: bool,
    pub history_persisted: bool,
    pub trend: TrendAnalysis,
    #[serde(default)]
    pub competitor_gaps: Vec<CompetitorGap>,
    pub forecasts: Vec<ImpactForecast>,
    pub elapsed_ms: u64,
    pub over_budget: bool,
}

impl EntityOutcome {
    /// Final (post-variance) aggregate value.
    pub fn final_aggregate(&self) -> f64 {
        self.final_scores
            .get(AGGREGATE_KEY)
            .copied()
            .unwrap_or(self.aggregate.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub requested: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub over_budget: usize,
    pub forecasts: usize,
}

/// Result of one batch run. Outcomes follow input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub schema_version: u32,
    pub as_of: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub outcomes: Vec<EntityOutcome>,
    pub skipped: Vec<SkippedEntity>,
    pub radar: RadarSummary,
    pub counts: BatchCounts,
}

/// Validated configuration plus collaborators.
pub struct Pipeline {
    config: PipelineConfig,
    models: Vec<CategoryModel>,
    injector: VarianceInjector,
    ranker: Ranker,
    model_id: ModelId,
    io: Collaborators,
}

impl Pipeline {
    /// Validate `config` and wire up the collaborators.
    pub fn new(config: PipelineConfig, io: Collaborators) -> Result<Self, PipelineError> {
        config.validate()?;
        let injector = VarianceInjector::new(config.variance.clone()).map_err(ConfigError::from)?;
        let ranker = Ranker::new(config.ranking).map_err(ConfigError::from)?;
        let models = config.models().into_iter().cloned().collect();
        let model_id = ModelId::new(config.model_id.clone());
        Ok(Self {
            config,
            models,
            injector,
            ranker,
            model_id,
            io,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    /// Run every entity for `as_of`. `now` stamps history points and bounds
    /// the history window.
    pub fn run_batch(
        &self,
        entities: &[EntityTarget],
        as_of: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<BatchReport, PipelineError> {
        let snapshot = self
            .io
            .events
            .recent(self.config.recent_event_limit)
            .map_err(PipelineError::EventSnapshot)?;
        info!(
            entities = entities.len(),
            events = snapshot.len(),
            %as_of,
            "starting batch"
        );

        let results: Vec<Result<EntityOutcome, SkippedEntity>> = if self.config.worker_threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.worker_threads)
                .build()
                .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;
            pool.install(|| {
                entities
                    .par_iter()
                    .map(|target| self.process_entity(target, as_of, now, &snapshot))
                    .collect()
            })
        } else {
            entities
                .iter()
                .map(|target| self.process_entity(target, as_of, now, &snapshot))
                .collect()
        };

        let mut outcomes = Vec::new();
        let mut skipped = Vec::new();
        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(skip) => skipped.push(skip),
            }
        }

        let counts = BatchCounts {
            requested: entities.len(),
            succeeded: outcomes.len(),
            skipped: skipped.len(),
            over_budget: outcomes.iter().filter(|o| o.over_budget).count(),
            forecasts: outcomes.iter().map(|o| o.forecasts.len()).sum(),
        };
        info!(
            succeeded = counts.succeeded,
            skipped = counts.skipped,
            over_budget = counts.over_budget,
            forecasts = counts.forecasts,
            "batch complete"
        );

        Ok(BatchReport {
            schema_version: SCHEMA_VERSION,
            as_of,
            generated_at: now,
            outcomes,
            skipped,
            radar: radar(&snapshot, self.config.recent_event_limit),
            counts,
        })
    }

    /// Rank a batch of triage cards for `user_id`.
    pub fn run_triage(
        &self,
        cards: &[CardInput],
        user_id: &str,
        similar_pool: &[PriorityCard],
        now: DateTime<Utc>,
    ) -> TriageReport {
        run_triage(&self.ranker, self.io.users.as_ref(), cards, user_id, similar_pool, now)
    }

    fn process_entity(
        &self,
        target: &EntityTarget,
        as_of: NaiveDate,
        now: DateTime<Utc>,
        snapshot: &[MarketEvent],
    ) -> Result<EntityOutcome, SkippedEntity> {
        let started = Instant::now();
        let entity = &target.entity_id;
        let skip = |stage: Stage, reason: String| {
            warn!(entity = %entity, stage = stage.as_str(), %reason, "skipping entity");
            SkippedEntity {
                entity_id: entity.clone(),
                stage,
                reason,
            }
        };

        // Pillar scores
        let mut scores = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let bundle = self
                .io
                .signals
                .get_signals(entity, model.category)
                .map_err(|e| skip(Stage::Signals, e.to_string()))?;
            let score = model
                .score(&bundle)
                .map_err(|e| skip(Stage::Scoring, e.to_string()))?;
            scores.push(score);
        }

        let agg = aggregate(entity, &scores, &self.config.aggregate_weights, target.pooling)
            .map_err(|e| skip(Stage::Aggregate, e.to_string()))?;

        // Variance: a pure function of (entity, day), so reruns reproduce it
        let mut current: BTreeMap<String, f64> = scores
            .iter()
            .map(|s| (s.category.as_str().to_string(), s.value))
            .collect();
        current.insert(AGGREGATE_KEY.to_string(), agg.value);
        let final_scores = self.injector.inject(entity.as_str(), as_of, &current);
        let final_aggregate = final_scores.get(AGGREGATE_KEY).copied().unwrap_or(agg.value);

        // History window is read before anything is written
        let since = now - Duration::days(self.config.history_window_days);
        let mut history = self
            .io
            .history
            .read(entity, Some(since))
            .map_err(|e| skip(Stage::HistoryRead, e.to_string()))?;

        // One point per entity per scoring day
        let history_persisted = if history.iter().any(|p| p.timestamp.date_naive() == as_of) {
            debug!(entity = %entity, %as_of, "history already has a point for this day");
            true
        } else {
            let mut point =
                ScoreHistoryPoint::new(entity.clone(), stamp(as_of, now), final_aggregate);
            point.component_signals = final_scores
                .iter()
                .filter(|(k, _)| k.as_str() != AGGREGATE_KEY)
                .map(|(k, v)| (k.clone(), *v))
                .collect();
            let persisted = match self.io.history.append(&point) {
                Ok(()) => true,
                Err(e) => {
                    warn!(entity = %entity, error = %e, "history append failed");
                    false
                }
            };
            history.push(point);
            history.sort_by_key(|p| p.timestamp);
            persisted
        };

        let variance_applied = self.record_variance(entity, as_of);

        let trend = analyze_trend(&history);
        let competitor_gaps = self.competitor_gaps(entity, final_aggregate);
        let forecasts = self.forecast_events(entity, snapshot);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let over_budget = self
            .config
            .entity_budget_ms
            .is_some_and(|budget| elapsed_ms > budget);
        if over_budget {
            warn!(entity = %entity, elapsed_ms, "entity exceeded time budget");
        }
        debug!(
            entity = %entity,
            aggregate = agg.value,
            velocity = trend.velocity,
            forecasts = forecasts.len(),
            "entity complete"
        );

        Ok(EntityOutcome {
            entity_id: entity.clone(),
            scores,
            aggregate: agg,
            final_scores,
            variance_applied,
            history_persisted,
            trend,
            competitor_gaps,
            forecasts,
            elapsed_ms,
            over_budget,
        })
    }

    /// Mark `as_of` in the ledger unless it is already there. Returns true
    /// when this call recorded the day.
    fn record_variance(&self, entity: &EntityId, as_of: NaiveDate) -> bool {
        match self.io.ledger.last_applied(entity) {
            Ok(Some(day)) if day == as_of => {
                debug!(entity = %entity, %as_of, "variance already recorded");
                return false;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(entity = %entity, error = %e, "variance ledger read failed");
            }
        }
        match self.io.ledger.mark_applied(entity, as_of) {
            Ok(()) => true,
            Err(e) => {
                warn!(entity = %entity, error = %e, "variance ledger write failed");
                false
            }
        }
    }

    fn competitor_gaps(&self, entity: &EntityId, own_score: f64) -> Vec<CompetitorGap> {
        match self.io.signals.competitor_scores(entity) {
            Ok(scores) => forecast_competitor_gaps(own_score, &scores),
            Err(e) => {
                warn!(entity = %entity, error = %e, "competitor scores unavailable");
                Vec::new()
            }
        }
    }

    fn forecast_events(&self, entity: &EntityId, snapshot: &[MarketEvent]) -> Vec<ImpactForecast> {
        let relevant: Vec<&MarketEvent> = snapshot.iter().filter(|e| e.affects(entity)).collect();
        if relevant.is_empty() {
            return Vec::new();
        }
        let impacts = self.io.events.historical_impacts(entity).unwrap_or_else(|e| {
            warn!(entity = %entity, error = %e, "historical impacts unavailable");
            Vec::new()
        });

        relevant
            .into_iter()
            .map(|event| {
                let forecast = forecast_impact(entity, &self.model_id, &impacts, event);
                if let Err(e) = self.io.forecasts.save(&forecast) {
                    warn!(
                        entity = %entity,
                        event = %event.id,
                        error = %e,
                        "forecast not persisted"
                    );
                }
                forecast
            })
            .collect()
    }
}

/// Timestamp for the history point of `as_of`: `now` on the current day,
/// otherwise `as_of` at `now`'s time of day.
fn stamp(as_of: NaiveDate, now: DateTime<Utc>) -> DateTime<Utc> {
    if now.date_naive() == as_of {
        now
    } else {
        Utc.from_utc_datetime(&as_of.and_time(now.time()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_keeps_now_on_the_current_day() {
        let now = Utc.with_ymd_and_hms(2026, 10, 12, 6, 30, 0).unwrap();
        assert_eq!(stamp(now.date_naive(), now), now);
    }

    #[test]
    fn backfilled_day_is_stamped_on_that_day() {
        let now = Utc.with_ymd_and_hms(2026, 10, 12, 6, 30, 0).unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 10, 9).unwrap();
        let stamped = stamp(day, now);
        assert_eq!(stamped.date_naive(), day);
        assert_eq!(stamped.time(), now.time());
    }
}
