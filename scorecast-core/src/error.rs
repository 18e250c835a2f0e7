//! Error taxonomy for the scoring core.
//!
//! Errors are scoped to what they abort: a `Configuration` error rejects the
//! whole run, everything else is isolated to one entity, category or card.

use thiserror::Error;

use crate::domain::Category;

/// Errors from composite scoring and aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// Bad weights or policies. Fatal for the run, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("missing signal '{metric}' for category {category}")]
    MissingSignal { category: Category, metric: String },

    #[error("signal '{metric}' for category {category} is not finite")]
    NonFiniteSignal { category: Category, metric: String },

    #[error("no score for category {0} in aggregate")]
    MissingCategory(Category),
}

impl ScoreError {
    /// Whether this error must abort the whole run rather than one entity.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Why a triage card was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedCard {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unknown level '{0}'")]
    InvalidLevel(String),

    #[error("unparseable timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("delta is not finite")]
    NonFiniteDelta,
}

/// Per-entity failure from a signal source (timeouts, upstream 4xx/5xx).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("no signals for entity '{entity}' in category {category}")]
    NotFound { entity: String, category: Category },

    #[error("upstream timeout after {0}ms")]
    Timeout(u64),

    #[error("upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// Store I/O failure. The core never retries these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
