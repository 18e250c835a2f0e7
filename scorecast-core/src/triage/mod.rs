//! Priority/triage ranking.
//!
//! Cards are scored on six weighted factors (each 0-100), sorted stably by
//! priority, and annotated with suggested actions and a resolution-time
//! estimate. Grouping is a separate pass that never touches ranking order.

pub mod factors;
pub mod grouping;
pub mod history;
pub mod ranker;
pub mod resolution;

pub use factors::{
    business_impact_factor, is_aged_critical, level_factor, recency_factor, similarity_factor,
    urgency_factor,
    user_history_factor, FactorScores, FactorWeights, AGED_CRITICAL_HOURS, HIGH_VALUE_TAGS,
    RECENCY_DECAY_PER_HOUR,
};
pub use grouping::{group_cards, CardGroup, GroupKey};
pub use history::UserHistory;
pub use ranker::{rank, RankedCard, Ranker, RankingOutcome, SkippedCard};
pub use resolution::{
    is_automatable, predicted_resolution_minutes, suggested_actions, ACTION_ESCALATE,
};
