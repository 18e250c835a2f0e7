//! Scorecast Runner — batch orchestration, triage pass, stores and export.
//!
//! This crate builds on `scorecast-core` to provide:
//! - TOML pipeline configuration with validated defaults
//! - The per-entity batch orchestrator (rayon fan-out, per-entity isolation)
//! - The triage pass over loosely-typed card inputs
//! - JSONL append-only history and forecast stores
//! - JSON/CSV export of batch and triage reports
//! - Batch fixtures for the CLI and integration tests

pub mod config;
pub mod export;
pub mod fixtures;
pub mod history;
pub mod pipeline;
pub mod triage;

pub use config::{ConfigError, PipelineConfig};
pub use export::{
    export_batch_json, export_outcomes_csv, export_queue_csv, export_triage_json,
    import_batch_json, save_batch_artifacts, save_triage_artifacts,
};
pub use fixtures::{BatchFixture, EntityFixture};
pub use history::{JsonlForecastStore, JsonlHistoryStore, JsonlLog};
pub use pipeline::{
    BatchCounts, BatchReport, Collaborators, EntityOutcome, EntityTarget, Pipeline, PipelineError,
    SkippedEntity, Stage, AGGREGATE_KEY, SCHEMA_VERSION,
};
pub use triage::{run_triage, valid_cards, TriageReport};
