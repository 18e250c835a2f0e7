//! Deterministic day-over-day variance.
//!
//! A seed is derived from `(entity_key, as_of_date)` with BLAKE3, fed into a
//! small LCG, and one uniform draw per policy decides whether (and how much)
//! that score dimension drifts. The injector is stateless: the same inputs
//! always produce the same output, on any machine.

pub mod injector;
pub mod seed;

pub use injector::{inject_variance, VarianceInjector, VariancePolicy, VarianceProfile};
pub use seed::{day_seed, DayLcg};
