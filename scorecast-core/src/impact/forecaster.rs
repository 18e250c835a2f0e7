use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::actions::{estimate_action_impact, ActionImpactEstimate};
use super::elasticity::{derive_elasticities, ElasticityCoefficient};
use crate::domain::{round_to, EntityId, EventId, HistoricalImpact, MarketEvent, ModelId, Severity};

pub const ACTION_SCHEMA_AUDIT: &str = "schema audit";
pub const ACTION_COMPETITOR_REVIEW: &str = "competitor review";

/// A pillar must exceed this β to earn a focus recommendation.
pub const FOCUS_BETA_THRESHOLD: f64 = 0.5;

/// Lowest reported forecast confidence.
pub const CONFIDENCE_FLOOR: f64 = 0.5;

/// β per pillar used for the forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub weights: BTreeMap<String, f64>,
}

/// A recommended action with the improvements it is expected to bring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub action: String,
    /// Empty when no estimate rule matches the action.
    pub estimates: Vec<ActionImpactEstimate>,
}

impl ActionPlan {
    pub fn for_action(action: &str) -> Self {
        Self {
            action: action.to_string(),
            estimates: estimate_action_impact(action),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastedImpact {
    pub expected_score_change: f64,
    pub confidence: f64,
    pub recommended_actions: Vec<String>,
    /// One plan per recommended action, same order.
    #[serde(default)]
    pub action_plans: Vec<ActionPlan>,
}

/// Forecast for one (entity, triggering event). Superseded, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactForecast {
    pub entity_id: EntityId,
    pub model_id: ModelId,
    pub event_id: EventId,
    pub timestamp: DateTime<Utc>,
    pub baseline: Baseline,
    pub forecast: ForecastedImpact,
    pub confidence: f64,
    #[serde(default)]
    pub elasticities: Vec<ElasticityCoefficient>,
}

/// Forecast the score impact of `event` on an entity.
///
/// `expected_score_change = base_impact(severity) × (1 + mean β)`, where the
/// mean is 0 without history. Confidence never drops below
/// [`CONFIDENCE_FLOOR`].
pub fn forecast_impact(
    entity_id: &EntityId,
    model_id: &ModelId,
    historical_impacts: &[HistoricalImpact],
    event: &MarketEvent,
) -> ImpactForecast {
    let elasticities = derive_elasticities(historical_impacts, event.event_type);

    let mean_beta = if elasticities.is_empty() {
        0.0
    } else {
        elasticities.iter().map(|e| e.beta).sum::<f64>() / elasticities.len() as f64
    };
    let expected = round_to(event.severity.base_impact() * (1.0 + mean_beta), 2);

    let confidence = elasticities
        .iter()
        .map(|e| e.confidence)
        .fold(CONFIDENCE_FLOOR, f64::max);

    let baseline = Baseline {
        weights: elasticities
            .iter()
            .map(|e| (e.pillar.clone(), e.beta))
            .collect(),
    };

    let recommended = recommended_actions(event.severity, &elasticities);
    let action_plans = recommended.iter().map(|a| ActionPlan::for_action(a)).collect();

    ImpactForecast {
        entity_id: entity_id.clone(),
        model_id: model_id.clone(),
        event_id: event.id.clone(),
        timestamp: event.detected_at,
        baseline,
        forecast: ForecastedImpact {
            expected_score_change: expected,
            confidence,
            recommended_actions: recommended,
            action_plans,
        },
        confidence,
        elasticities,
    }
}

/// Fixed, ordered recommendation rules.
pub fn recommended_actions(
    severity: Severity,
    elasticities: &[ElasticityCoefficient],
) -> Vec<String> {
    let mut actions = Vec::new();
    if matches!(severity, Severity::High | Severity::Critical) {
        actions.push(ACTION_SCHEMA_AUDIT.to_string());
        actions.push(ACTION_COMPETITOR_REVIEW.to_string());
    }

    let mut best: Option<&ElasticityCoefficient> = None;
    for e in elasticities {
        let better = match best {
            None => true,
            Some(b) => e.beta > b.beta || (e.beta == b.beta && e.pillar < b.pillar),
        };
        if better {
            best = Some(e);
        }
    }
    if let Some(top) = best.filter(|e| e.beta > FOCUS_BETA_THRESHOLD) {
        actions.push(format!("focus optimization on {}", top.pillar));
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventType;
    use chrono::TimeZone;

    fn event(severity: Severity) -> MarketEvent {
        MarketEvent {
            id: EventId::new("evt-7"),
            event_type: EventType::AlgorithmUpdate,
            severity,
            detected_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            affected_entities: None,
            metadata: BTreeMap::new(),
        }
    }

    fn obs(pillar: &str, impact: f64) -> HistoricalImpact {
        HistoricalImpact {
            pillar: pillar.into(),
            impact,
            event_type: EventType::AlgorithmUpdate,
        }
    }

    #[test]
    fn critical_event_without_history() {
        let f = forecast_impact(
            &EntityId::new("loc-1"),
            &ModelId::new("elasticity-v1"),
            &[],
            &event(Severity::Critical),
        );
        assert_eq!(f.forecast.expected_score_change, -15.0);
        assert_eq!(f.confidence, 0.5);
        assert_eq!(
            f.forecast.recommended_actions,
            vec!["schema audit".to_string(), "competitor review".to_string()]
        );
        assert!(f.baseline.weights.is_empty());
        assert_eq!(f.timestamp, event(Severity::Critical).detected_at);
    }

    #[test]
    fn every_recommendation_carries_its_estimates() {
        let impacts = vec![obs("voice_structure", 0.9)];
        let f = forecast_impact(
            &EntityId::new("loc-1"),
            &ModelId::new("m"),
            &impacts,
            &event(Severity::Critical),
        );
        let plans = &f.forecast.action_plans;
        let actions: Vec<_> = plans.iter().map(|p| p.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["schema audit", "competitor review", "focus optimization on voice_structure"]
        );
        assert_eq!(plans[0].estimates[0].metric, "schema_coverage");
        assert_eq!(plans[0].estimates[0].estimated_improvement, 8.0);
        assert_eq!(plans[1].estimates[0].metric, "eeat");
        assert_eq!(plans[1].estimates[0].timeframe_hours, 12);
        assert!(plans[2].estimates.is_empty());
    }

    #[test]
    fn betas_scale_the_base_impact() {
        let impacts = vec![obs("voice_structure", 0.8), obs("perception", 0.2)];
        let f = forecast_impact(
            &EntityId::new("loc-1"),
            &ModelId::new("m"),
            &impacts,
            &event(Severity::High),
        );
        // mean β = 0.5
        assert_eq!(f.forecast.expected_score_change, -10.5);
        assert_eq!(
            f.forecast.recommended_actions.last().map(String::as_str),
            Some("focus optimization on voice_structure")
        );
        assert_eq!(f.baseline.weights["perception"], 0.2);
    }

    #[test]
    fn low_severity_only_recommends_focus() {
        let e = vec![ElasticityCoefficient {
            pillar: "citation_index".into(),
            beta: 0.9,
            confidence: 0.3,
        }];
        assert_eq!(
            recommended_actions(Severity::Low, &e),
            vec!["focus optimization on citation_index".to_string()]
        );
    }

    #[test]
    fn focus_requires_beta_above_threshold() {
        let e = vec![ElasticityCoefficient {
            pillar: "page_quality".into(),
            beta: 0.5,
            confidence: 1.0,
        }];
        assert!(recommended_actions(Severity::Medium, &e).is_empty());
    }

    #[test]
    fn focus_tie_prefers_smaller_pillar_name() {
        let coefficient = |pillar: &str| ElasticityCoefficient {
            pillar: pillar.into(),
            beta: 0.75,
            confidence: 1.0,
        };
        let e = vec![coefficient("voice_structure"), coefficient("citation_index")];
        assert_eq!(
            recommended_actions(Severity::Low, &e),
            vec!["focus optimization on citation_index".to_string()]
        );
    }

    #[test]
    fn confidence_takes_the_strongest_coefficient() {
        let impacts: Vec<_> = (0..8).map(|_| obs("page_quality", 0.1)).collect();
        let f = forecast_impact(
            &EntityId::new("e"),
            &ModelId::new("m"),
            &impacts,
            &event(Severity::Low),
        );
        assert!((f.confidence - 0.8).abs() < 1e-9);
        assert_eq!(f.forecast.confidence, f.confidence);
    }
}
