use serde::{Deserialize, Serialize};

/// Estimated effect of carrying out an optimization action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionImpactEstimate {
    pub metric: String,
    pub estimated_improvement: f64,
    pub confidence: f64,
    pub timeframe_hours: u32,
}

struct Rule {
    keywords: &'static [&'static str],
    effects: &'static [(&'static str, f64, f64, u32)],
}

const RULES: &[Rule] = &[
    Rule {
        keywords: &["schema"],
        effects: &[
            ("schema_coverage", 8.0, 0.85, 24),
            ("eeat", 5.0, 0.75, 48),
            ("ai_visibility", 3.0, 0.65, 72),
        ],
    },
    Rule {
        keywords: &["review"],
        effects: &[("eeat", 7.0, 0.8, 12), ("ai_visibility", 4.0, 0.7, 48)],
    },
    Rule {
        keywords: &["content", "blog"],
        effects: &[("eeat", 6.0, 0.7, 168), ("ai_visibility", 5.0, 0.65, 240)],
    },
];

/// Keyword-matched improvement estimates for a proposed action.
///
/// Matching is case-insensitive; every matching rule contributes, in table
/// order. An action matching nothing yields no estimates.
pub fn estimate_action_impact(action: &str) -> Vec<ActionImpactEstimate> {
    let lowered = action.to_lowercase();
    RULES
        .iter()
        .filter(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
        .flat_map(|rule| rule.effects.iter())
        .map(|(metric, improvement, confidence, hours)| ActionImpactEstimate {
            metric: (*metric).to_string(),
            estimated_improvement: *improvement,
            confidence: *confidence,
            timeframe_hours: *hours,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_action() {
        let e = estimate_action_impact("Run a Schema audit");
        assert_eq!(e.len(), 3);
        assert_eq!(e[0].metric, "schema_coverage");
        assert_eq!(e[0].estimated_improvement, 8.0);
        assert_eq!(e[0].timeframe_hours, 24);
    }

    #[test]
    fn blog_counts_as_content() {
        let e = estimate_action_impact("publish weekly BLOG posts");
        assert_eq!(e.len(), 2);
        assert_eq!(e[1].metric, "ai_visibility");
        assert_eq!(e[1].timeframe_hours, 240);
    }

    #[test]
    fn several_rules_can_match() {
        let e = estimate_action_impact("competitor review of schema markup");
        assert_eq!(e.len(), 5);
    }

    #[test]
    fn unknown_action() {
        assert!(estimate_action_impact("rebrand").is_empty());
    }
}
