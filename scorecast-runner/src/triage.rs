//! Triage pass: validate, rank and group a batch of cards for one user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scorecast_core::domain::{CardInput, PriorityCard};
use scorecast_core::sources::UserHistoryProvider;
use scorecast_core::triage::{
    group_cards, CardGroup, RankedCard, Ranker, SkippedCard, UserHistory,
};

use crate::pipeline::SCHEMA_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub schema_version: u32,
    pub user_id: String,
    pub generated_at: DateTime<Utc>,
    /// Descending priority; equal scores keep input order.
    pub ranked: Vec<RankedCard>,
    /// Exact-key clusters over the ranked queue.
    pub groups: Vec<CardGroup>,
    pub skipped: Vec<SkippedCard>,
    /// The user's history could not be loaded; ranked with an empty one.
    pub history_degraded: bool,
}

/// Cards of `inputs` that validate, in input order. The usual similarity pool
/// when no separate reference set is supplied.
pub fn valid_cards(inputs: &[CardInput]) -> Vec<PriorityCard> {
    inputs
        .iter()
        .filter_map(|input| PriorityCard::try_from(input).ok())
        .collect()
}

/// Rank `cards` for `user_id`. A failed history lookup degrades to an empty
/// history instead of failing the pass.
pub fn run_triage(
    ranker: &Ranker,
    users: &dyn UserHistoryProvider,
    cards: &[CardInput],
    user_id: &str,
    similar_pool: &[PriorityCard],
    now: DateTime<Utc>,
) -> TriageReport {
    let (history, history_degraded) = match users.get_history(user_id) {
        Ok(h) => (h, false),
        Err(e) => {
            warn!(user_id, error = %e, "user history unavailable, ranking without it");
            (UserHistory::default(), true)
        }
    };

    let outcome = ranker.rank_inputs(cards, &history, similar_pool, now);
    let groups = group_cards(outcome.ranked.iter().map(|r| &r.card));
    info!(
        user_id,
        ranked = outcome.ranked.len(),
        skipped = outcome.skipped.len(),
        groups = groups.len(),
        "triage complete"
    );

    TriageReport {
        schema_version: SCHEMA_VERSION,
        user_id: user_id.to_string(),
        generated_at: now,
        ranked: outcome.ranked,
        groups,
        skipped: outcome.skipped,
        history_degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use scorecast_core::domain::{CardKind, PriorityLevel};
    use scorecast_core::sources::InMemoryUserHistory;
    use scorecast_core::StoreError;

    struct BrokenUsers;

    impl UserHistoryProvider for BrokenUsers {
        fn get_history(&self, _user_id: &str) -> Result<UserHistory, StoreError> {
            Err(StoreError::Io("connection reset".into()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 5, 9, 0, 0).unwrap()
    }

    fn inputs() -> Vec<CardInput> {
        let mut a = PriorityCard::new("a", CardKind::Incident, PriorityLevel::High, now());
        a.context.topic = Some("checkout".into());
        let b = PriorityCard::new("b", CardKind::Incident, PriorityLevel::High, now());
        let mut c = a.clone();
        c.id = scorecast_core::domain::CardId::new("c");
        vec![CardInput::from(&a), CardInput::from(&b), CardInput::from(&c)]
    }

    #[test]
    fn groups_follow_ranked_queue() {
        let users = InMemoryUserHistory::new();
        let report = run_triage(&Ranker::default(), &users, &inputs(), "u-1", &[], now());
        assert_eq!(report.ranked.len(), 3);
        assert_eq!(report.groups.len(), 2);
        let grouped: usize = report.groups.iter().map(|g| g.card_ids.len()).sum();
        assert_eq!(grouped, 3);
        assert!(!report.history_degraded);
    }

    #[test]
    fn batch_as_its_own_pool_scores_similarity() {
        let users = InMemoryUserHistory::new();
        let cards = inputs();
        let pool = valid_cards(&cards);
        assert_eq!(pool.len(), 3);

        let report = run_triage(&Ranker::default(), &users, &cards, "u-1", &pool, now());
        let a = report.ranked.iter().find(|r| r.card.id.as_str() == "a").unwrap();
        assert!(a.factors.similarity > 0.0);

        let alone = run_triage(&Ranker::default(), &users, &cards, "u-1", &[], now());
        assert!(alone.ranked.iter().all(|r| r.factors.similarity == 0.0));
    }

    #[test]
    fn invalid_inputs_stay_out_of_the_pool() {
        let mut cards = inputs();
        cards.push(CardInput::default());
        assert_eq!(valid_cards(&cards).len(), 3);
    }

    #[test]
    fn broken_history_degrades() {
        let report = run_triage(&Ranker::default(), &BrokenUsers, &inputs(), "u-1", &[], now());
        assert!(report.history_degraded);
        assert_eq!(report.ranked.len(), 3);
    }
}
