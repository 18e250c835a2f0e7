use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::forecast::{Ensemble, ForecastSummary};
use super::regression::LinearFit;
use super::series::Series;
use crate::domain::{round_to, ScoreHistoryPoint};

/// Velocity (pts/day) beyond which a series is trending.
pub const DIRECTION_THRESHOLD: f64 = 0.5;

const ACCELERATION_MIN_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

impl Direction {
    pub fn from_velocity(velocity: f64) -> Self {
        if velocity > DIRECTION_THRESHOLD {
            Direction::Up
        } else if velocity < -DIRECTION_THRESHOLD {
            Direction::Down
        } else {
            Direction::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Stable => "stable",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement of one component signal across the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDelta {
    pub signal: String,
    pub first: f64,
    pub last: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalTrends {
    pub most_improved: Option<SignalDelta>,
    pub most_declined: Option<SignalDelta>,
    /// Last minus first observed value, per signal.
    pub deltas: BTreeMap<String, f64>,
}

/// Result of analyzing a score history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub point_count: usize,
    /// OLS slope, points per day.
    pub velocity: f64,
    /// Change in velocity between the two halves, points per day².
    pub acceleration: f64,
    /// R² of the regression.
    pub confidence: f64,
    pub direction: Direction,
    pub forecast: ForecastSummary,
    pub signals: SignalTrends,
}

impl TrendAnalysis {
    pub fn degenerate(point_count: usize) -> Self {
        Self {
            point_count,
            velocity: 0.0,
            acceleration: 0.0,
            confidence: 0.0,
            direction: Direction::Stable,
            forecast: ForecastSummary::degenerate(),
            signals: SignalTrends::default(),
        }
    }
}

/// Analyze a timestamp-ordered score history.
///
/// Never fails: fewer than two points produce a zeroed, `stable` result.
pub fn analyze_trend(history: &[ScoreHistoryPoint]) -> TrendAnalysis {
    if history.len() < 2 {
        return TrendAnalysis::degenerate(history.len());
    }

    let series = Series::from_history(history);
    let fit = LinearFit::fit(&series.xs, &series.ys);
    let ensemble = Ensemble::new(&series, fit);

    TrendAnalysis {
        point_count: series.len(),
        velocity: round_to(fit.slope, 4),
        acceleration: round_to(acceleration(&series), 4),
        confidence: round_to(fit.r2, 4),
        direction: Direction::from_velocity(fit.slope),
        forecast: ensemble.summary(),
        signals: signal_trends(history),
    }
}

fn acceleration(series: &Series) -> f64 {
    let n = series.len();
    if n < ACCELERATION_MIN_POINTS {
        return 0.0;
    }
    let mid = n / 2;
    let (v1, c1) = half_velocity(series, 0, mid);
    let (v2, c2) = half_velocity(series, mid, n);
    let gap = c2 - c1;
    if gap <= f64::EPSILON {
        return 0.0;
    }
    (v2 - v1) / gap
}

// Two-point velocity over [start, end) and the half's time midpoint.
fn half_velocity(series: &Series, start: usize, end: usize) -> (f64, f64) {
    let (x0, x1) = (series.xs[start], series.xs[end - 1]);
    let (y0, y1) = (series.ys[start], series.ys[end - 1]);
    let dx = x1 - x0;
    let velocity = if dx > f64::EPSILON { (y1 - y0) / dx } else { 0.0 };
    (velocity, (x0 + x1) / 2.0)
}

fn signal_trends(history: &[ScoreHistoryPoint]) -> SignalTrends {
    let mut bounds: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for point in history {
        for (name, value) in &point.component_signals {
            bounds
                .entry(name.as_str())
                .and_modify(|(_, last)| *last = *value)
                .or_insert((*value, *value));
        }
    }

    let mut trends = SignalTrends::default();
    // BTreeMap order plus strict comparison keeps the lexicographically
    // smallest name on ties.
    for (name, (first, last)) in bounds {
        let delta = round_to(last - first, 4);
        trends.deltas.insert(name.to_string(), delta);
        let entry = || SignalDelta {
            signal: name.to_string(),
            first,
            last,
            delta,
        };
        if delta > 0.0 && trends.most_improved.as_ref().map_or(true, |b| delta > b.delta) {
            trends.most_improved = Some(entry());
        }
        if delta < 0.0 && trends.most_declined.as_ref().map_or(true, |b| delta < b.delta) {
            trends.most_declined = Some(entry());
        }
    }
    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityId;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 6, 0, 0).unwrap()
    }

    fn daily(scores: &[f64]) -> Vec<ScoreHistoryPoint> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                ScoreHistoryPoint::new(EntityId::new("e"), t0() + Duration::days(i as i64), *s)
            })
            .collect()
    }

    #[test]
    fn near_linear_climb() {
        let t = analyze_trend(&daily(&[70.0, 72.0, 75.0, 78.0]));
        assert!((t.velocity - 2.7).abs() < 1e-9);
        assert_eq!(t.direction, Direction::Up);
        assert!(t.confidence > 0.99);
        // halves: (72-70)/1 = 2, (78-75)/1 = 3; midpoints 0.5 and 2.5
        assert!((t.acceleration - 0.5).abs() < 1e-9);
        assert!(t.forecast.next_7_days > 78.0);
        assert!(t.forecast.next_30_days <= 100.0);
    }

    #[test]
    fn direction_thresholds() {
        assert_eq!(Direction::from_velocity(0.5), Direction::Stable);
        assert_eq!(Direction::from_velocity(0.51), Direction::Up);
        assert_eq!(Direction::from_velocity(-0.5), Direction::Stable);
        assert_eq!(Direction::from_velocity(-0.51), Direction::Down);
    }

    #[test]
    fn fewer_than_two_points_is_degenerate() {
        for history in [Vec::new(), daily(&[88.0])] {
            let t = analyze_trend(&history);
            assert_eq!(t.velocity, 0.0);
            assert_eq!(t.acceleration, 0.0);
            assert_eq!(t.confidence, 0.0);
            assert_eq!(t.direction, Direction::Stable);
            assert_eq!(t.forecast.next_7_days, 0.0);
            assert_eq!(t.forecast.next_30_days, 0.0);
            assert!(t.signals.most_improved.is_none());
        }
    }

    #[test]
    fn three_points_have_no_acceleration() {
        let t = analyze_trend(&daily(&[10.0, 20.0, 40.0]));
        assert_eq!(t.acceleration, 0.0);
    }

    #[test]
    fn declining_series() {
        let t = analyze_trend(&daily(&[90.0, 85.0, 81.0, 76.0, 70.0]));
        assert_eq!(t.direction, Direction::Down);
        assert!(t.velocity < 0.0);
    }

    #[test]
    fn signal_decomposition_picks_extremes() {
        let mut history = daily(&[60.0, 62.0, 64.0]);
        history[0].component_signals = BTreeMap::from([
            ("page_speed".to_string(), 40.0),
            ("readability".to_string(), 70.0),
            ("schema_coverage".to_string(), 50.0),
        ]);
        history[2].component_signals = BTreeMap::from([
            ("page_speed".to_string(), 55.0),
            ("readability".to_string(), 60.0),
            ("schema_coverage".to_string(), 65.0),
        ]);
        let t = analyze_trend(&history);
        // page_speed and schema_coverage tie at +15; the smaller name wins
        let improved = t.signals.most_improved.unwrap();
        assert_eq!(improved.signal, "page_speed");
        assert_eq!(improved.delta, 15.0);
        let declined = t.signals.most_declined.unwrap();
        assert_eq!(declined.signal, "readability");
        assert_eq!(declined.delta, -10.0);
    }

    #[test]
    fn unchanged_signals_are_neither() {
        let mut history = daily(&[60.0, 61.0]);
        for p in &mut history {
            p.component_signals.insert("nap_consistency".into(), 80.0);
        }
        let t = analyze_trend(&history);
        assert!(t.signals.most_improved.is_none());
        assert!(t.signals.most_declined.is_none());
        assert_eq!(t.signals.deltas["nap_consistency"], 0.0);
    }

    #[test]
    fn irregular_spacing_uses_fractional_days() {
        let history = vec![
            ScoreHistoryPoint::new(EntityId::new("e"), t0(), 50.0),
            ScoreHistoryPoint::new(EntityId::new("e"), t0() + Duration::hours(12), 51.0),
        ];
        let t = analyze_trend(&history);
        assert!((t.velocity - 2.0).abs() < 1e-9);
    }
}
