//! Domain types for the scoring pipeline.

pub mod card;
pub mod event;
pub mod ids;
pub mod score;
pub mod signal;

pub use card::{CardContext, CardInput, CardKind, PriorityCard, PriorityLevel};
pub use event::{EventType, HistoricalImpact, MarketEvent, Severity};
pub use ids::{CardId, EntityId, EventId, ModelId};
pub use score::{CompositeScore, ScoreHistoryPoint};
pub use signal::{Category, SignalBundle};

/// Clamp to the [0, 100] score range.
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(104.2), 100.0);
        assert_eq!(clamp_score(55.5), 55.5);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(81.34999, 1), 81.3);
        assert_eq!(round_to(72.125, 2), 72.13);
        assert_eq!(round_to(-1.25, 1), -1.3);
    }
}
