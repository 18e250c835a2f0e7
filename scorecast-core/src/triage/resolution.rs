use super::history::UserHistory;
use crate::domain::{CardKind, PriorityCard, PriorityLevel};

/// Prefixed to the suggestions of every critical card.
pub const ACTION_ESCALATE: &str = "escalate to on-call";

const CRITICAL_MULTIPLIER: f64 = 0.5;
const AUTOMATABLE_MULTIPLIER: f64 = 0.2;

fn default_minutes(kind: CardKind) -> f64 {
    match kind {
        CardKind::SlaBreach => 60.0,
        CardKind::Incident => 120.0,
        CardKind::ScoreDrop => 240.0,
        CardKind::MarketEvent => 480.0,
        CardKind::CompetitorMove => 720.0,
        CardKind::ReviewAlert => 90.0,
        CardKind::SystemHealth => 45.0,
        CardKind::Other => 360.0,
    }
}

fn kind_actions(kind: CardKind) -> &'static [&'static str] {
    match kind {
        CardKind::ScoreDrop => &[
            "review score breakdown",
            "compare with competitors",
            "schedule content refresh",
        ],
        CardKind::Incident => &[
            "open incident channel",
            "identify root cause",
            "post status update",
        ],
        CardKind::SlaBreach => &[
            "notify account owner",
            "apply service credit policy",
            "run post-mortem",
        ],
        CardKind::SystemHealth => &["restart affected service", "check monitoring dashboards"],
        CardKind::ReviewAlert => &["respond to review", "flag for reputation team"],
        CardKind::CompetitorMove => &["competitor review", "adjust content strategy"],
        CardKind::MarketEvent => &["schema audit", "monitor pillar scores"],
        CardKind::Other => &["triage manually"],
    }
}

/// Kinds a runbook can resolve without a human.
pub fn is_automatable(kind: CardKind) -> bool {
    matches!(kind, CardKind::SystemHealth | CardKind::ReviewAlert)
}

/// Per-kind suggestions. The user's preferred actions from the kind's table
/// come first, in preference order; critical cards lead with an escalation.
pub fn suggested_actions(card: &PriorityCard, history: &UserHistory) -> Vec<String> {
    let table = kind_actions(card.kind);
    let mut actions = Vec::with_capacity(table.len() + 1);
    if card.level == PriorityLevel::Critical {
        actions.push(ACTION_ESCALATE.to_string());
    }
    for preferred in &history.preferred_actions {
        if table.contains(&preferred.as_str()) && !actions.contains(preferred) {
            actions.push(preferred.clone());
        }
    }
    for action in table {
        if !actions.iter().any(|a| a == action) {
            actions.push((*action).to_string());
        }
    }
    actions
}

/// Expected minutes to resolve, at least 1.
pub fn predicted_resolution_minutes(card: &PriorityCard, history: &UserHistory) -> u32 {
    let mut minutes = history
        .avg_response_minutes(card.kind)
        .unwrap_or_else(|| default_minutes(card.kind));
    if card.level == PriorityLevel::Critical {
        minutes *= CRITICAL_MULTIPLIER;
    }
    if is_automatable(card.kind) {
        minutes *= AUTOMATABLE_MULTIPLIER;
    }
    minutes.round().clamp(1.0, u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn card(kind: CardKind, level: PriorityLevel) -> PriorityCard {
        PriorityCard::new("c-1", kind, level, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn default_minutes_with_multipliers() {
        let h = UserHistory::default();
        let minutes = |kind, level| predicted_resolution_minutes(&card(kind, level), &h);
        assert_eq!(minutes(CardKind::Incident, PriorityLevel::High), 120);
        assert_eq!(minutes(CardKind::Incident, PriorityLevel::Critical), 60);
        assert_eq!(minutes(CardKind::SystemHealth, PriorityLevel::Low), 9);
        // 45 × 0.5 × 0.2 = 4.5 rounds away from zero
        assert_eq!(minutes(CardKind::SystemHealth, PriorityLevel::Critical), 5);
    }

    #[test]
    fn history_overrides_default() {
        let mut h = UserHistory::default();
        h.avg_response_time.insert("review_alert".into(), 2.0);
        // 2 × 0.2 = 0.4, floored at one minute
        let review = card(CardKind::ReviewAlert, PriorityLevel::Low);
        assert_eq!(predicted_resolution_minutes(&review, &h), 1);
        h.avg_response_time.insert("score_drop".into(), 100.0);
        let drop = card(CardKind::ScoreDrop, PriorityLevel::Low);
        assert_eq!(predicted_resolution_minutes(&drop, &h), 100);
    }

    #[test]
    fn critical_cards_escalate_first() {
        let incident = card(CardKind::Incident, PriorityLevel::Critical);
        let a = suggested_actions(&incident, &UserHistory::default());
        assert_eq!(a[0], ACTION_ESCALATE);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn preferred_actions_move_to_front() {
        let h = UserHistory {
            preferred_actions: vec![
                "schedule content refresh".into(),
                "not in the table".into(),
                "compare with competitors".into(),
            ],
            ..UserHistory::default()
        };
        let a = suggested_actions(&card(CardKind::ScoreDrop, PriorityLevel::Medium), &h);
        assert_eq!(
            a,
            vec![
                "schedule content refresh",
                "compare with competitors",
                "review score breakdown",
            ]
        );
    }
}
