use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{round_to, EventType, HistoricalImpact};

/// Observation count at which a coefficient reaches full confidence.
const FULL_CONFIDENCE_SAMPLES: f64 = 10.0;

/// Estimated sensitivity of one pillar to an event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticityCoefficient {
    pub pillar: String,
    pub beta: f64,
    pub confidence: f64,
}

/// One coefficient per distinct pillar in `impacts`, sorted by pillar.
///
/// β is the mean impact over observations of the same event type. A pillar
/// without any matching observation falls back to the mean of all its
/// observations at half confidence.
pub fn derive_elasticities(
    impacts: &[HistoricalImpact],
    event_type: EventType,
) -> Vec<ElasticityCoefficient> {
    #[derive(Default)]
    struct Acc {
        all_sum: f64,
        all_n: usize,
        match_sum: f64,
        match_n: usize,
    }

    let mut by_pillar: BTreeMap<&str, Acc> = BTreeMap::new();
    for obs in impacts.iter().filter(|o| o.impact.is_finite()) {
        let acc = by_pillar.entry(obs.pillar.as_str()).or_default();
        acc.all_sum += obs.impact;
        acc.all_n += 1;
        if obs.event_type == event_type {
            acc.match_sum += obs.impact;
            acc.match_n += 1;
        }
    }

    by_pillar
        .into_iter()
        .map(|(pillar, acc)| {
            let (beta, confidence) = if acc.match_n > 0 {
                (
                    acc.match_sum / acc.match_n as f64,
                    (acc.match_n as f64 / FULL_CONFIDENCE_SAMPLES).min(1.0),
                )
            } else {
                (
                    acc.all_sum / acc.all_n as f64,
                    0.5 * (acc.all_n as f64 / FULL_CONFIDENCE_SAMPLES).min(1.0),
                )
            };
            ElasticityCoefficient {
                pillar: pillar.to_string(),
                beta: round_to(beta, 4),
                confidence: round_to(confidence, 4),
            }
        })
        .collect()
}
