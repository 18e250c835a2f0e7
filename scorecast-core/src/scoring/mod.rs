//! Composite score calculation.
//!
//! - `WeightTable`: validated sub-metric (or category) weights summing to 1.0.
//! - `AdjustmentRule`: bounded, deterministic threshold deltas per category.
//! - `CategoryModel`: weights + rules for one pillar; `score()` is pure.
//! - `aggregate()`: weighted blend of pillar scores with explicit pooling.

pub mod aggregate;
pub mod calculator;
pub mod rules;
pub mod weights;

pub use aggregate::{aggregate, AggregateScore, Pooling, POOL_PEER_WEIGHT, POOL_SELF_WEIGHT};
pub use calculator::{score, CategoryModel};
pub use rules::{AdjustmentRule, Comparison, DEFAULT_MAX_ADJUSTMENT};
pub use weights::{WeightTable, WEIGHT_TOLERANCE};
