use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::factors::{FactorScores, FactorWeights};
use super::history::UserHistory;
use super::resolution::{predicted_resolution_minutes, suggested_actions};
use crate::domain::{round_to, CardInput, PriorityCard};
use crate::error::ScoreError;

/// A card with its computed priority. Recomputed on every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCard {
    #[serde(flatten)]
    pub card: PriorityCard,
    pub priority_score: f64,
    pub factors: FactorScores,
    pub suggested_actions: Vec<String>,
    pub predicted_resolution_minutes: u32,
}

/// A card input that could not be ranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCard {
    /// Position in the input batch.
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub ranked: Vec<RankedCard>,
    pub skipped: Vec<SkippedCard>,
}

/// Multi-factor ranker with validated weights.
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    weights: FactorWeights,
}

impl Ranker {
    pub fn new(weights: FactorWeights) -> Result<Self, ScoreError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &FactorWeights {
        &self.weights
    }

    /// Rank `cards` by descending priority. Equal scores keep input order.
    pub fn rank(
        &self,
        cards: &[PriorityCard],
        history: &UserHistory,
        similar_pool: &[PriorityCard],
        now: DateTime<Utc>,
    ) -> Vec<RankedCard> {
        let mut ranked: Vec<RankedCard> = cards
            .iter()
            .map(|card| {
                let factors = FactorScores::compute(card, history, similar_pool, now);
                RankedCard {
                    card: card.clone(),
                    priority_score: round_to(self.weights.combine(&factors), 2),
                    factors,
                    suggested_actions: suggested_actions(card, history),
                    predicted_resolution_minutes: predicted_resolution_minutes(card, history),
                }
            })
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        ranked
    }

    /// Validate loosely-typed inputs, then rank the well-formed ones.
    pub fn rank_inputs(
        &self,
        inputs: &[CardInput],
        history: &UserHistory,
        similar_pool: &[PriorityCard],
        now: DateTime<Utc>,
    ) -> RankingOutcome {
        let mut cards = Vec::with_capacity(inputs.len());
        let mut skipped = Vec::new();
        for (index, input) in inputs.iter().enumerate() {
            match PriorityCard::try_from(input) {
                Ok(card) => cards.push(card),
                Err(e) => {
                    debug!(index, id = ?input.id, error = %e, "skipping malformed card");
                    skipped.push(SkippedCard {
                        index,
                        id: input.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        RankingOutcome {
            ranked: self.rank(&cards, history, similar_pool, now),
            skipped,
        }
    }
}

/// Rank with default weights, using the card set itself as the similarity
/// pool.
pub fn rank(
    cards: &[PriorityCard],
    user_history: &UserHistory,
    now: DateTime<Utc>,
) -> Vec<RankedCard> {
    Ranker::default().rank(cards, user_history, cards, now)
}
