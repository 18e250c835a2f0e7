//! Threshold adjustment rules.
//!
//! Each rule looks at one raw sub-metric and contributes a fixed delta when
//! its threshold fires. The summed delta is bounded per category. Rules whose
//! metric is absent from the bundle do not fire.

use serde::{Deserialize, Serialize};

use crate::domain::{Category, SignalBundle};

/// Bound on the summed adjustment for one category, in score points.
pub const DEFAULT_MAX_ADJUSTMENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Above,
    AtLeast,
    Below,
}

impl Comparison {
    fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Above => value > threshold,
            Self::AtLeast => value >= threshold,
            Self::Below => value < threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    pub metric: String,
    pub when: Comparison,
    pub threshold: f64,
    pub delta: f64,
}

impl AdjustmentRule {
    pub fn new(metric: &str, when: Comparison, threshold: f64, delta: f64) -> Self {
        Self {
            metric: metric.to_string(),
            when,
            threshold,
            delta,
        }
    }

    /// Delta contributed by this rule for the given bundle (0.0 if it does not fire).
    pub fn evaluate(&self, signals: &SignalBundle) -> f64 {
        match signals.get(&self.metric) {
            Some(v) if v.is_finite() && self.when.holds(v, self.threshold) => self.delta,
            _ => 0.0,
        }
    }

    pub fn default_rules(category: Category) -> Vec<Self> {
        use Comparison::*;
        match category {
            Category::PageQuality => vec![
                Self::new("word_count", Above, 1000.0, 3.0),
                Self::new("word_count", Below, 300.0, -5.0),
            ],
            Category::Perception => vec![
                Self::new("readability", AtLeast, 80.0, 2.0),
                Self::new("readability", Below, 40.0, -3.0),
            ],
            Category::VoiceStructure => vec![
                Self::new("schema_coverage", AtLeast, 90.0, 3.0),
                Self::new("schema_coverage", Below, 30.0, -5.0),
            ],
            Category::CitationIndex => vec![
                Self::new("nap_consistency", Below, 50.0, -4.0),
                Self::new("source_authority", Above, 90.0, 2.0),
            ],
        }
    }
}

/// Sum every rule's delta and bound the total to `±max_adjustment`.
pub fn total_adjustment(
    rules: &[AdjustmentRule],
    signals: &SignalBundle,
    max_adjustment: f64,
) -> f64 {
    let raw: f64 = rules.iter().map(|r| r.evaluate(signals)).sum();
    raw.clamp(-max_adjustment, max_adjustment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityId;
    use chrono::Utc;

    fn bundle(category: Category) -> SignalBundle {
        SignalBundle::new(EntityId::new("e"), category, Utc::now())
    }

    #[test]
    fn long_content_gets_bonus_short_gets_penalty() {
        let rules = AdjustmentRule::default_rules(Category::PageQuality);
        let long = bundle(Category::PageQuality).with("word_count", 1500.0);
        let short = bundle(Category::PageQuality).with("word_count", 120.0);
        let mid = bundle(Category::PageQuality).with("word_count", 600.0);

        assert_eq!(total_adjustment(&rules, &long, DEFAULT_MAX_ADJUSTMENT), 3.0);
        assert_eq!(total_adjustment(&rules, &short, DEFAULT_MAX_ADJUSTMENT), -5.0);
        assert_eq!(total_adjustment(&rules, &mid, DEFAULT_MAX_ADJUSTMENT), 0.0);
    }

    #[test]
    fn absent_metric_does_not_fire() {
        let rules = AdjustmentRule::default_rules(Category::PageQuality);
        assert_eq!(
            total_adjustment(&rules, &bundle(Category::PageQuality), DEFAULT_MAX_ADJUSTMENT),
            0.0
        );
    }

    #[test]
    fn total_is_bounded() {
        let rules = vec![
            AdjustmentRule::new("a", Comparison::Above, 0.0, 4.0),
            AdjustmentRule::new("b", Comparison::Above, 0.0, 4.0),
        ];
        let b = bundle(Category::Perception).with("a", 1.0).with("b", 1.0);
        assert_eq!(total_adjustment(&rules, &b, 5.0), 5.0);
    }

    #[test]
    fn threshold_edges() {
        let at_least = AdjustmentRule::new("readability", Comparison::AtLeast, 80.0, 2.0);
        let above = AdjustmentRule::new("readability", Comparison::Above, 80.0, 2.0);
        let b = bundle(Category::Perception).with("readability", 80.0);
        assert_eq!(at_least.evaluate(&b), 2.0);
        assert_eq!(above.evaluate(&b), 0.0);
    }
}
