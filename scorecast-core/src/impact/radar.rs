use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{EventType, MarketEvent, Severity};

/// Counts over the most recent events. Every severity and event type is
/// present, zero when unseen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSummary {
    pub window: usize,
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<EventType, usize>,
    pub newest: Option<DateTime<Utc>>,
    pub oldest: Option<DateTime<Utc>>,
}

/// Summarize the `limit` most recent events by `detected_at`.
pub fn radar(events: &[MarketEvent], limit: usize) -> RadarSummary {
    let mut recent: Vec<&MarketEvent> = events.iter().collect();
    recent.sort_by(|a, b| b.detected_at.cmp(&a.detected_at).then_with(|| a.id.cmp(&b.id)));
    recent.truncate(limit);

    let mut by_severity: BTreeMap<Severity, usize> = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ]
    .into_iter()
    .map(|s| (s, 0))
    .collect();
    let mut by_type: BTreeMap<EventType, usize> =
        EventType::ALL.into_iter().map(|t| (t, 0)).collect();

    for event in &recent {
        *by_severity.entry(event.severity).or_default() += 1;
        *by_type.entry(event.event_type).or_default() += 1;
    }

    RadarSummary {
        window: limit,
        total: recent.len(),
        by_severity,
        by_type,
        newest: recent.first().map(|e| e.detected_at),
        oldest: recent.last().map(|e| e.detected_at),
    }
}
