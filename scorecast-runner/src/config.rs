//! Pipeline configuration — TOML file with documented defaults.
//!
//! Every table is validated before any entity is processed: a bad weight
//! table, variance policy or ranking weight rejects the whole run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use scorecast_core::domain::Category;
use scorecast_core::scoring::{CategoryModel, WeightTable};
use scorecast_core::triage::FactorWeights;
use scorecast_core::variance::VarianceProfile;
use scorecast_core::ScoreError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("serialize config TOML: {0}")]
    Serialize(String),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Score(#[from] ScoreError),
}

/// Everything a batch run needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads for the entity fan-out; 0 or 1 runs sequentially.
    pub worker_threads: usize,
    /// How far back trend analysis reads history.
    pub history_window_days: i64,
    /// Size of the event snapshot taken at batch start.
    pub recent_event_limit: usize,
    /// Identifier stamped on every impact forecast.
    pub model_id: String,
    /// Optional wall-clock budget per entity pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_budget_ms: Option<u64>,
    pub aggregate_weights: WeightTable,
    pub ranking: FactorWeights,
    pub variance: VarianceProfile,
    pub categories: Vec<CategoryModel>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            history_window_days: 90,
            recent_event_limit: 20,
            model_id: "elasticity-v1".to_string(),
            entity_budget_ms: None,
            aggregate_weights: WeightTable::default_aggregate(),
            ranking: FactorWeights::default(),
            variance: VarianceProfile::default(),
            categories: Category::ALL
                .iter()
                .map(|c| CategoryModel::default_for(*c))
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_window_days <= 0 {
            return Err(ConfigError::Invalid(format!(
                "history_window_days must be positive, got {}",
                self.history_window_days
            )));
        }
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::Invalid("model_id must not be empty".into()));
        }
        for category in Category::ALL {
            let count = self.categories.iter().filter(|m| m.category == category).count();
            if count != 1 {
                return Err(ConfigError::Invalid(format!(
                    "expected exactly one model for category {category}, found {count}"
                )));
            }
        }
        for model in &self.categories {
            model.validate()?;
        }
        self.aggregate_weights.validate("aggregate")?;
        for (name, _) in self.aggregate_weights.iter() {
            if Category::parse(name).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "aggregate weight for unknown category '{name}'"
                )));
            }
        }
        self.variance.validate()?;
        self.ranking.validate()?;
        Ok(())
    }

    /// Category models in pillar order.
    pub fn models(&self) -> Vec<&CategoryModel> {
        let mut models: Vec<&CategoryModel> = self.categories.iter().collect();
        models.sort_by_key(|m| m.category);
        models
    }
}
