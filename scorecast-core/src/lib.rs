//! Scorecast Core — scoring, variance, trend, impact and triage.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! the in-memory collaborator implementations:
//! - Composite scoring of the four QAI pillars and their aggregate
//! - Deterministic per-day variance injection
//! - Trend analysis (velocity, acceleration) and a three-model forecast ensemble
//! - Market-event impact forecasting from historical elasticities
//! - Multi-factor triage ranking with similarity grouping
//! - Collaborator traits (signal source, stores, ledgers) the runner wires up

pub mod domain;
pub mod error;
pub mod impact;
pub mod scoring;
pub mod sources;
pub mod trend;
pub mod triage;
pub mod variance;

pub use error::{MalformedCard, ScoreError, SourceError, StoreError};
