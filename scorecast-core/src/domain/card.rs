//! Triage cards — actionable items awaiting prioritization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::ids::CardId;
use crate::error::MalformedCard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    ScoreDrop,
    Incident,
    SlaBreach,
    SystemHealth,
    ReviewAlert,
    CompetitorMove,
    MarketEvent,
    #[serde(other)]
    Other,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScoreDrop => "score_drop",
            Self::Incident => "incident",
            Self::SlaBreach => "sla_breach",
            Self::SystemHealth => "system_health",
            Self::ReviewAlert => "review_alert",
            Self::CompetitorMove => "competitor_move",
            Self::MarketEvent => "market_event",
            Self::Other => "other",
        }
    }

    /// Unknown kinds map to `Other` rather than failing.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "score_drop" => Self::ScoreDrop,
            "incident" => Self::Incident,
            "sla_breach" => Self::SlaBreach,
            "system_health" => Self::SystemHealth,
            "review_alert" => Self::ReviewAlert,
            "competitor_move" => Self::CompetitorMove,
            "market_event" => Self::MarketEvent,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured card context: grouping attributes plus open-ended numeric metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

/// A validated triage card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityCard {
    pub id: CardId,
    pub kind: CardKind,
    pub level: PriorityLevel,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(default)]
    pub context: CardContext,
}

impl PriorityCard {
    pub fn new(id: &str, kind: CardKind, level: PriorityLevel, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: CardId::new(id),
            kind,
            level,
            timestamp,
            delta: None,
            context: CardContext::default(),
        }
    }
}

/// Loosely-typed card as delivered by upstream producers.
///
/// Every field is optional so a single bad record never fails the whole
/// payload; `PriorityCard::try_from` decides what is malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub context: CardContext,
}

impl From<&PriorityCard> for CardInput {
    fn from(card: &PriorityCard) -> Self {
        Self {
            id: Some(card.id.0.clone()),
            kind: Some(card.kind.as_str().to_string()),
            level: Some(card.level.as_str().to_string()),
            timestamp: Some(card.timestamp.to_rfc3339()),
            delta: card.delta,
            context: card.context.clone(),
        }
    }
}

impl TryFrom<&CardInput> for PriorityCard {
    type Error = MalformedCard;

    fn try_from(input: &CardInput) -> Result<Self, Self::Error> {
        let id = match input.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Err(MalformedCard::MissingField("id")),
        };
        let kind = input
            .kind
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(CardKind::parse)
            .ok_or(MalformedCard::MissingField("kind"))?;
        let level_raw = input
            .level
            .as_deref()
            .ok_or(MalformedCard::MissingField("level"))?;
        let level = PriorityLevel::parse(level_raw)
            .ok_or_else(|| MalformedCard::InvalidLevel(level_raw.to_string()))?;
        let ts_raw = input
            .timestamp
            .as_deref()
            .ok_or(MalformedCard::MissingField("timestamp"))?;
        let timestamp = DateTime::parse_from_rfc3339(ts_raw)
            .map_err(|_| MalformedCard::InvalidTimestamp(ts_raw.to_string()))?
            .with_timezone(&Utc);
        if let Some(d) = input.delta {
            if !d.is_finite() {
                return Err(MalformedCard::NonFiniteDelta);
            }
        }

        Ok(Self {
            id: CardId(id),
            kind,
            level,
            timestamp,
            delta: input.delta,
            context: input.context.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CardInput {
        CardInput {
            id: Some("c-1".into()),
            kind: Some("incident".into()),
            level: Some("HIGH".into()),
            timestamp: Some("2026-05-01T10:00:00Z".into()),
            delta: Some(-4.5),
            context: CardContext::default(),
        }
    }

    #[test]
    fn well_formed_input_converts() {
        let card = PriorityCard::try_from(&input()).unwrap();
        assert_eq!(card.id.as_str(), "c-1");
        assert_eq!(card.kind, CardKind::Incident);
        assert_eq!(card.level, PriorityLevel::High);
        assert_eq!(card.delta, Some(-4.5));
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let mut no_id = input();
        no_id.id = None;
        assert_eq!(
            PriorityCard::try_from(&no_id).unwrap_err(),
            MalformedCard::MissingField("id")
        );

        let mut no_ts = input();
        no_ts.timestamp = None;
        assert_eq!(
            PriorityCard::try_from(&no_ts).unwrap_err(),
            MalformedCard::MissingField("timestamp")
        );
    }

    #[test]
    fn bad_level_and_timestamp_are_malformed() {
        let mut bad_level = input();
        bad_level.level = Some("urgent".into());
        assert!(matches!(
            PriorityCard::try_from(&bad_level),
            Err(MalformedCard::InvalidLevel(_))
        ));

        let mut bad_ts = input();
        bad_ts.timestamp = Some("yesterday".into());
        assert!(matches!(
            PriorityCard::try_from(&bad_ts),
            Err(MalformedCard::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn unknown_kind_becomes_other() {
        let mut odd = input();
        odd.kind = Some("weather_alert".into());
        assert_eq!(PriorityCard::try_from(&odd).unwrap().kind, CardKind::Other);
    }

    #[test]
    fn card_roundtrips_through_input() {
        let card = PriorityCard::try_from(&input()).unwrap();
        let back = PriorityCard::try_from(&CardInput::from(&card)).unwrap();
        assert_eq!(card, back);
    }
}
