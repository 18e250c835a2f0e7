use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::round_to;

/// Projected growth factor applied to the current gap.
pub const GAP_GROWTH: f64 = 1.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapRisk {
    Low,
    Medium,
    High,
}

impl GapRisk {
    pub fn from_gap(predicted_gap: f64) -> Self {
        if predicted_gap > 10.0 {
            GapRisk::High
        } else if predicted_gap > 5.0 {
            GapRisk::Medium
        } else {
            GapRisk::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorGap {
    pub competitor: String,
    pub competitor_score: f64,
    pub current_gap: f64,
    pub predicted_gap: f64,
    pub risk: GapRisk,
}

/// Project each competitor's lead over `own_score`.
///
/// Sorted by predicted gap, largest first; ties by competitor name.
pub fn forecast_competitor_gaps(
    own_score: f64,
    competitors: &BTreeMap<String, f64>,
) -> Vec<CompetitorGap> {
    let mut gaps: Vec<CompetitorGap> = competitors
        .iter()
        .filter(|(_, score)| score.is_finite())
        .map(|(name, score)| {
            let current = score - own_score;
            let predicted = round_to(current * GAP_GROWTH, 2);
            CompetitorGap {
                competitor: name.clone(),
                competitor_score: *score,
                current_gap: round_to(current, 2),
                predicted_gap: predicted,
                risk: GapRisk::from_gap(predicted),
            }
        })
        .collect();
    gaps.sort_by(|a, b| {
        b.predicted_gap
            .total_cmp(&a.predicted_gap)
            .then_with(|| a.competitor.cmp(&b.competitor))
    });
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaps_are_ranked_and_bucketed() {
        let competitors = BTreeMap::from([
            ("acme".to_string(), 82.0),
            ("bolt".to_string(), 71.0),
            ("zeta".to_string(), 60.0),
        ]);
        let g = forecast_competitor_gaps(65.0, &competitors);
        assert_eq!(g[0].competitor, "acme");
        assert_eq!(g[0].predicted_gap, 17.85);
        assert_eq!(g[0].risk, GapRisk::High);
        assert_eq!(g[1].predicted_gap, 6.3);
        assert_eq!(g[1].risk, GapRisk::Medium);
        assert_eq!(g[2].predicted_gap, -5.25);
        assert_eq!(g[2].risk, GapRisk::Low);
    }

    #[test]
    fn ties_break_by_name() {
        let competitors = BTreeMap::from([("b".to_string(), 70.0), ("a".to_string(), 70.0)]);
        let g = forecast_competitor_gaps(50.0, &competitors);
        assert_eq!(g[0].competitor, "a");
    }
}
