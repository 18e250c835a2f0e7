use chrono::{DateTime, Utc};

use crate::domain::ScoreHistoryPoint;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Numeric view of a score history: elapsed days since the first point.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
}

impl Series {
    pub fn from_history(history: &[ScoreHistoryPoint]) -> Self {
        let origin = history.first().map(|p| p.timestamp);
        let mut xs = Vec::with_capacity(history.len());
        let mut ys = Vec::with_capacity(history.len());
        let mut timestamps = Vec::with_capacity(history.len());
        for p in history {
            let elapsed = origin.map_or(0.0, |o| (p.timestamp - o).num_seconds() as f64);
            xs.push(elapsed / SECONDS_PER_DAY);
            ys.push(p.score);
            timestamps.push(p.timestamp);
        }
        Self { xs, ys, timestamps }
    }

    pub fn len(&self) -> usize {
        self.ys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ys.is_empty()
    }

    pub fn last_x(&self) -> f64 {
        self.xs.last().copied().unwrap_or(0.0)
    }

    pub fn last_y(&self) -> f64 {
        self.ys.last().copied().unwrap_or(0.0)
    }

    /// Mean spacing between consecutive points, in days.
    pub fn mean_spacing(&self) -> f64 {
        if self.len() < 2 {
            return 0.0;
        }
        (self.last_x() - self.xs[0]) / (self.len() - 1) as f64
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityId;
    use chrono::{Duration, TimeZone};

    #[test]
    fn elapsed_days_are_fractional() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let history = vec![
            ScoreHistoryPoint::new(EntityId::new("e"), t0, 50.0),
            ScoreHistoryPoint::new(EntityId::new("e"), t0 + Duration::hours(12), 51.0),
            ScoreHistoryPoint::new(EntityId::new("e"), t0 + Duration::days(2), 53.0),
        ];
        let s = Series::from_history(&history);
        assert_eq!(s.xs, vec![0.0, 0.5, 2.0]);
        assert_eq!(s.mean_spacing(), 1.0);
    }

    #[test]
    fn helpers_on_empty() {
        let s = Series::from_history(&[]);
        assert!(s.is_empty());
        assert_eq!(s.last_y(), 0.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[3.0]), 0.0);
    }
}
