//! Ordinary least squares over (elapsed days, score).

use serde::{Deserialize, Serialize};

/// Result of a simple linear regression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, clamped to [0, 1].
    pub r2: f64,
}

impl LinearFit {
    pub const ZERO: LinearFit = LinearFit {
        slope: 0.0,
        intercept: 0.0,
        r2: 0.0,
    };

    /// Fit `y = slope·x + intercept`.
    ///
    /// Fewer than two points, or all points at the same x, yield a flat line
    /// through the mean with r2 = 0. A series with no variance that the line
    /// fits exactly has r2 = 1.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Self {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return Self::ZERO;
        }
        let nf = n as f64;
        let mean_x = xs[..n].iter().sum::<f64>() / nf;
        let mean_y = ys[..n].iter().sum::<f64>() / nf;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for i in 0..n {
            let dx = xs[i] - mean_x;
            sxx += dx * dx;
            sxy += dx * (ys[i] - mean_y);
        }
        if sxx <= f64::EPSILON {
            return Self {
                slope: 0.0,
                intercept: mean_y,
                r2: 0.0,
            };
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let mut ss_tot = 0.0;
        let mut ss_res = 0.0;
        for i in 0..n {
            let predicted = slope * xs[i] + intercept;
            ss_res += (ys[i] - predicted).powi(2);
            ss_tot += (ys[i] - mean_y).powi(2);
        }
        let r2 = if ss_tot <= f64::EPSILON {
            if ss_res <= f64::EPSILON {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        Self {
            slope,
            intercept,
            r2: r2.clamp(0.0, 1.0),
        }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_line() {
        let fit = LinearFit::fit(&[0.0, 1.0, 2.0, 3.0], &[10.0, 12.0, 14.0, 16.0]);
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 10.0).abs() < 1e-12);
        assert!((fit.r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn near_linear_series() {
        let fit = LinearFit::fit(&[0.0, 1.0, 2.0, 3.0], &[70.0, 72.0, 75.0, 78.0]);
        assert!((fit.slope - 2.7).abs() < 1e-9);
        // ss_res = 0.30, ss_tot = 36.75
        assert!((fit.r2 - (1.0 - 0.30 / 36.75)).abs() < 1e-9);
    }

    #[test]
    fn flat_series_is_a_perfect_fit() {
        let fit = LinearFit::fit(&[0.0, 1.0, 2.0], &[50.0, 50.0, 50.0]);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r2, 1.0);
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(LinearFit::fit(&[1.0], &[5.0]), LinearFit::ZERO);
        let same_x = LinearFit::fit(&[2.0, 2.0], &[1.0, 9.0]);
        assert_eq!(same_x.slope, 0.0);
        assert_eq!(same_x.intercept, 5.0);
        assert_eq!(same_x.r2, 0.0);
    }

    #[test]
    fn noise_gives_low_r2() {
        let fit = LinearFit::fit(&[0.0, 1.0, 2.0, 3.0, 4.0], &[50.0, 60.0, 45.0, 62.0, 48.0]);
        assert!(fit.r2 < 0.2);
    }
}
