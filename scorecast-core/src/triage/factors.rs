//! The six ranking factors. Every factor is normalized to [0, 100].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::history::UserHistory;
use crate::domain::{CardKind, PriorityCard, PriorityLevel};
use crate::error::ScoreError;

/// Recency points lost per elapsed hour.
pub const RECENCY_DECAY_PER_HOUR: f64 = 2.0;

/// A critical card older than this is always at maximum urgency.
pub const AGED_CRITICAL_HOURS: f64 = 24.0;

/// Context tags that raise business impact by [`TAG_BOOST`] each.
pub const HIGH_VALUE_TAGS: [&str; 5] = ["revenue", "vip", "legal", "security", "outage"];

const TAG_BOOST: f64 = 10.0;
const DELTA_BOOST_PER_POINT: f64 = 2.0;
const DELTA_BOOST_CAP: f64 = 20.0;
const USER_HISTORY_SCALE: f64 = 10.0;
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Per-factor scores for one card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub level: f64,
    pub recency: f64,
    pub user_history: f64,
    pub business_impact: f64,
    pub urgency: f64,
    pub similarity: f64,
}

/// Fixed factor weights. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub level: f64,
    pub recency: f64,
    pub user_history: f64,
    pub business_impact: f64,
    pub urgency: f64,
    pub similarity: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            level: 0.30,
            recency: 0.20,
            user_history: 0.15,
            business_impact: 0.20,
            urgency: 0.10,
            similarity: 0.05,
        }
    }
}

impl FactorWeights {
    fn as_array(&self) -> [(&'static str, f64); 6] {
        [
            ("level", self.level),
            ("recency", self.recency),
            ("user_history", self.user_history),
            ("business_impact", self.business_impact),
            ("urgency", self.urgency),
            ("similarity", self.similarity),
        ]
    }

    pub fn validate(&self) -> Result<(), ScoreError> {
        let mut sum = 0.0;
        for (name, w) in self.as_array() {
            if !w.is_finite() || w < 0.0 {
                return Err(ScoreError::Configuration(format!(
                    "ranking weight '{name}' must be a non-negative number, got {w}"
                )));
            }
            sum += w;
        }
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ScoreError::Configuration(format!(
                "ranking weights sum to {sum}, expected 1.0"
            )));
        }
        Ok(())
    }

    pub fn combine(&self, f: &FactorScores) -> f64 {
        self.level * f.level
            + self.recency * f.recency
            + self.user_history * f.user_history
            + self.business_impact * f.business_impact
            + self.urgency * f.urgency
            + self.similarity * f.similarity
    }
}

impl FactorScores {
    pub fn compute(
        card: &PriorityCard,
        history: &UserHistory,
        similar_pool: &[PriorityCard],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            level: level_factor(card.level),
            recency: recency_factor(card.timestamp, now),
            user_history: user_history_factor(card, history),
            business_impact: business_impact_factor(card),
            urgency: urgency_factor(card, now),
            similarity: similarity_factor(card, similar_pool),
        }
    }
}

pub fn level_factor(level: PriorityLevel) -> f64 {
    match level {
        PriorityLevel::Critical => 100.0,
        PriorityLevel::High => 75.0,
        PriorityLevel::Medium => 50.0,
        PriorityLevel::Low => 25.0,
        PriorityLevel::Info => 10.0,
    }
}

fn age_hours(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - timestamp).num_seconds() as f64 / 3600.0
}

/// Linear decay from 100; timestamps in the future count as brand new.
pub fn recency_factor(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age = age_hours(timestamp, now);
    if age <= 0.0 {
        return 100.0;
    }
    (100.0 - RECENCY_DECAY_PER_HOUR * age).max(0.0)
}

pub fn user_history_factor(card: &PriorityCard, history: &UserHistory) -> f64 {
    let hits = history.frequency(card.kind.as_str()) + history.frequency(card.level.as_str());
    (USER_HISTORY_SCALE * hits as f64).min(100.0)
}

fn base_impact(kind: CardKind) -> f64 {
    match kind {
        CardKind::SlaBreach => 90.0,
        CardKind::Incident => 80.0,
        CardKind::ScoreDrop => 70.0,
        CardKind::MarketEvent => 60.0,
        CardKind::CompetitorMove => 55.0,
        CardKind::ReviewAlert => 50.0,
        CardKind::SystemHealth => 40.0,
        CardKind::Other => 30.0,
    }
}

pub fn business_impact_factor(card: &PriorityCard) -> f64 {
    let delta_boost = card
        .delta
        .map_or(0.0, |d| (DELTA_BOOST_PER_POINT * d.abs()).min(DELTA_BOOST_CAP));
    let tags = card
        .context
        .tags
        .iter()
        .filter(|t| HIGH_VALUE_TAGS.contains(&t.to_ascii_lowercase().as_str()))
        .count();
    (base_impact(card.kind) + delta_boost + TAG_BOOST * tags as f64).min(100.0)
}

/// Whether a critical card has waited past [`AGED_CRITICAL_HOURS`].
pub fn is_aged_critical(card: &PriorityCard, now: DateTime<Utc>) -> bool {
    card.level == PriorityLevel::Critical && age_hours(card.timestamp, now) > AGED_CRITICAL_HOURS
}

/// Old and critical must never rank low: both map to maximum urgency.
pub fn urgency_factor(card: &PriorityCard, now: DateTime<Utc>) -> f64 {
    if is_aged_critical(card, now) || card.level == PriorityLevel::Critical {
        return 100.0;
    }
    match (card.kind, card.level) {
        (CardKind::SlaBreach, _) => 95.0,
        (CardKind::Incident, _) => 80.0,
        (_, PriorityLevel::High) => 70.0,
        (_, PriorityLevel::Medium) => 40.0,
        (_, PriorityLevel::Low) => 20.0,
        _ => 10.0,
    }
}

/// Best attribute match against `pool`, skipping the card itself.
pub fn similarity_factor(card: &PriorityCard, pool: &[PriorityCard]) -> f64 {
    pool.iter()
        .filter(|other| other.id != card.id)
        .map(|other| {
            let mut points = 0.0;
            if other.kind == card.kind {
                points += 40.0;
            }
            if other.level == card.level {
                points += 20.0;
            }
            if card.context.topic.is_some() && other.context.topic == card.context.topic {
                points += 25.0;
            }
            if card.context.thread_id.is_some()
                && other.context.thread_id == card.context.thread_id
            {
                points += 15.0;
            }
            points
        })
        .fold(0.0, f64::max)
        .min(100.0)
}
