use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::seed::DayLcg;
use crate::domain::{clamp_score, round_to, Category};
use crate::error::ScoreError;

/// Drift policy for one score dimension.
///
/// With probability `1 − frequency` nothing changes; otherwise a variance
/// uniform on `[min, max]` is added.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariancePolicy {
    pub min: f64,
    pub max: f64,
    pub frequency: f64,
}

impl VariancePolicy {
    pub fn new(min: f64, max: f64, frequency: f64) -> Self {
        Self { min, max, frequency }
    }

    pub fn validate(&self, dimension: &str) -> Result<(), ScoreError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ScoreError::Configuration(format!(
                "variance policy '{dimension}': need finite min <= max, got [{}, {}]",
                self.min, self.max
            )));
        }
        if !(0.0..=1.0).contains(&self.frequency) {
            return Err(ScoreError::Configuration(format!(
                "variance policy '{dimension}': frequency must be in [0, 1], got {}",
                self.frequency
            )));
        }
        Ok(())
    }

    /// Map one uniform draw `u ∈ [0, 1)` to a variance, or `None` for no change.
    ///
    /// `u < frequency` is rescaled to `[0, 1)`, so the variance is uniform on
    /// `[min, max]` given that a change happens.
    pub fn variance_for(&self, u: f64) -> Option<f64> {
        if u >= self.frequency {
            return None;
        }
        let t = u / self.frequency;
        Some(self.min + t * (self.max - self.min))
    }

    /// Apply one draw to a score: clamped to [0, 100], rounded to 1 decimal.
    pub fn apply(&self, score: f64, u: f64) -> f64 {
        match self.variance_for(u) {
            Some(v) => round_to(clamp_score(score + v), 1),
            None => score,
        }
    }
}

/// Policies per dimension. Draw order is the map's key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VarianceProfile(pub BTreeMap<String, VariancePolicy>);

impl Default for VarianceProfile {
    fn default() -> Self {
        let mut policies: BTreeMap<String, VariancePolicy> = Category::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), VariancePolicy::new(-1.5, 1.5, 0.7)))
            .collect();
        policies.insert("aggregate".into(), VariancePolicy::new(-2.0, 2.0, 0.8));
        Self(policies)
    }
}

impl VarianceProfile {
    pub fn validate(&self) -> Result<(), ScoreError> {
        self.0.iter().try_for_each(|(dim, p)| p.validate(dim))
    }
}

/// Stateless variance injector over a validated profile.
#[derive(Debug, Clone)]
pub struct VarianceInjector {
    profile: VarianceProfile,
}

impl VarianceInjector {
    pub fn new(profile: VarianceProfile) -> Result<Self, ScoreError> {
        profile.validate()?;
        Ok(Self { profile })
    }

    pub fn profile(&self) -> &VarianceProfile {
        &self.profile
    }

    /// The variance each dimension receives for `(entity_key, as_of)`.
    ///
    /// One draw per policy in key order, regardless of which scores exist,
    /// so a dimension's draw never depends on another dimension's presence.
    pub fn variance_vector(
        &self,
        entity_key: &str,
        as_of: NaiveDate,
    ) -> BTreeMap<String, Option<f64>> {
        let mut rng = DayLcg::for_day(entity_key, as_of);
        self.profile
            .0
            .iter()
            .map(|(dim, policy)| {
                let u: f64 = rng.gen();
                (dim.clone(), policy.variance_for(u))
            })
            .collect()
    }

    /// Apply the day's variance to `current_scores`. Dimensions without a
    /// policy, or whose draw says "no change", pass through untouched.
    pub fn inject(
        &self,
        entity_key: &str,
        as_of: NaiveDate,
        current_scores: &BTreeMap<String, f64>,
    ) -> BTreeMap<String, f64> {
        let mut rng = DayLcg::for_day(entity_key, as_of);
        let mut out = current_scores.clone();
        for (dim, policy) in &self.profile.0 {
            let u: f64 = rng.gen();
            if let Some(score) = out.get_mut(dim) {
                *score = policy.apply(*score, u);
            }
        }
        out
    }
}

/// Free-function form of [`VarianceInjector::inject`].
pub fn inject_variance(
    injector: &VarianceInjector,
    entity_key: &str,
    as_of: NaiveDate,
    current_scores: &BTreeMap<String, f64>,
) -> BTreeMap<String, f64> {
    injector.inject(entity_key, as_of, current_scores)
}
