//! The two-tier missing-value repair policy.
//!
//! Every feature row is a concatenation of fixed-length runs, one run of
//! consecutive periods per ratio. Each run is repaired independently:
//!
//! - no missing entries, or nothing observed at all: left untouched;
//! - fewer observed points than the regression threshold: missing entries
//!   take the mean of the observed ones;
//! - otherwise, gaps strictly inside the observed index range are filled by
//!   natural cubic spline interpolation, and indices outside that range by a
//!   least-squares line fitted over the contiguous interpolated span.
//!
//! Interpolation happens only inside the convex hull of evidence; beyond it
//! the policy extrapolates linearly.

use crate::linear::LinearFit;
use crate::spline::CubicSpline;
use ndarray::{Array2, s};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while repairing a feature matrix.
#[derive(Debug, Error)]
pub enum ImputeError {
    /// Period length cannot support interpolation
    #[error("period length must be at least 2, got {0}")]
    PeriodTooShort(usize),

    /// Regression threshold below the minimum fit size
    #[error("regression threshold must be at least 2, got {0}")]
    ThresholdTooLow(usize),

    /// Matrix width is not a whole number of runs
    #[error("matrix width {width} is not a multiple of the period length {periods}")]
    MisalignedMatrix {
        /// Number of columns in the matrix
        width: usize,
        /// Configured run length
        periods: usize,
    },
}

/// Configuration for missing-value repair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputeConfig {
    /// Length of each per-ratio run (default: 11).
    pub periods: usize,

    /// Minimum observed points required to fit spline/regression; sparser
    /// runs fall back to the observed mean (default: 4).
    pub min_fit_points: usize,

    /// Decimal places kept for interpolated and extrapolated values
    /// (default: 3).
    pub decimals: u32,
}

impl Default for ImputeConfig {
    fn default() -> Self {
        Self {
            periods: 11,
            min_fit_points: 4,
            decimals: 3,
        }
    }
}

/// Repairs missing entries in the raw feature matrix.
#[derive(Debug)]
pub struct Imputer {
    config: ImputeConfig,
}

impl Imputer {
    /// Create an imputer, validating the configuration.
    pub fn new(config: ImputeConfig) -> Result<Self, ImputeError> {
        if config.periods < 2 {
            return Err(ImputeError::PeriodTooShort(config.periods));
        }
        if config.min_fit_points < 2 {
            return Err(ImputeError::ThresholdTooLow(config.min_fit_points));
        }
        Ok(Self { config })
    }

    /// Create with default configuration.
    ///
    /// # Errors
    /// Returns an error if the default configuration is invalid (should not
    /// happen).
    pub fn try_default() -> Result<Self, ImputeError> {
        Self::new(ImputeConfig::default())
    }

    /// Repair every run of every row in place.
    ///
    /// # Errors
    /// Fails when the matrix width is not a multiple of the configured run
    /// length.
    pub fn repair_matrix(&self, matrix: &mut Array2<f64>) -> Result<(), ImputeError> {
        let width = matrix.ncols();
        let periods = self.config.periods;
        if width % periods != 0 {
            return Err(ImputeError::MisalignedMatrix { width, periods });
        }

        let mut run = vec![0.0; periods];
        for mut row in matrix.rows_mut() {
            for start in (0..width).step_by(periods) {
                let mut window = row.slice_mut(s![start..start + periods]);
                run.clear();
                run.extend(window.iter());
                self.repair_run(&mut run);
                for (slot, value) in window.iter_mut().zip(&run) {
                    *slot = *value;
                }
            }
        }

        info!(
            rows = matrix.nrows(),
            runs_per_row = width / periods,
            "feature matrix repaired"
        );
        Ok(())
    }

    /// Repair one run of consecutive periods in place.
    pub fn repair_run(&self, run: &mut [f64]) {
        let observed: Vec<(usize, f64)> = run
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .map(|(i, v)| (i, *v))
            .collect();
        let n_obs = observed.len();

        if n_obs == 0 || n_obs == run.len() {
            return;
        }

        if n_obs < self.config.min_fit_points {
            let mean = observed.iter().map(|(_, v)| v).sum::<f64>() / n_obs as f64;
            for value in run.iter_mut() {
                if value.is_nan() {
                    *value = mean;
                }
            }
            return;
        }

        let lo = observed[0].0;
        let hi = observed[n_obs - 1].0;

        // Interior gaps: spline over the observed knots.
        if hi - lo + 1 != n_obs {
            let knots: Vec<(f64, f64)> = observed.iter().map(|&(i, v)| (i as f64, v)).collect();
            if let Some(spline) = CubicSpline::fit(&knots) {
                for i in lo + 1..hi {
                    if run[i].is_nan() {
                        run[i] = round_to(spline.evaluate(i as f64), self.config.decimals);
                    }
                }
            }
        }

        // Exterior gaps: line fitted on the now-contiguous span.
        if hi - lo + 1 != run.len() {
            let xs: Vec<f64> = (lo..=hi).map(|i| i as f64).collect();
            let ys: Vec<f64> = run[lo..=hi].to_vec();
            if let Some(line) = LinearFit::fit(&xs, &ys) {
                for (i, value) in run.iter_mut().enumerate() {
                    if i < lo || i > hi {
                        *value = round_to(line.predict(i as f64), self.config.decimals);
                    }
                }
            }
        }
    }
}

/// Round to a fixed number of decimal places.
fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rstest::rstest;

    fn imputer(periods: usize) -> Imputer {
        Imputer::new(ImputeConfig {
            periods,
            ..ImputeConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_complete_run_untouched() {
        let imp = imputer(5);
        let mut run = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let before = run.clone();
        imp.repair_run(&mut run);
        assert_eq!(run, before);
    }

    #[test]
    fn test_all_missing_untouched() {
        let imp = imputer(4);
        let mut run = vec![f64::NAN; 4];
        imp.repair_run(&mut run);
        assert!(run.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_sparse_run_takes_mean() {
        // Exactly three observed values: mean fallback, 6.0 everywhere.
        let imp = imputer(11);
        let mut run = vec![f64::NAN; 11];
        run[1] = 5.0;
        run[6] = 7.0;
        run[9] = 6.0;
        imp.repair_run(&mut run);
        for (i, v) in run.iter().enumerate() {
            let expected = match i {
                1 => 5.0,
                6 => 7.0,
                9 => 6.0,
                _ => 6.0,
            };
            assert_abs_diff_eq!(*v, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_boundary_law_linear_observations() {
        // Four observations on the line y = 2x + 1 spanning [2, 7]: the
        // interior gaps come from the spline (exact on collinear knots) and
        // the exterior slots from the fitted line, which is the same line.
        let imp = imputer(11);
        let mut run = vec![f64::NAN; 11];
        for i in [2usize, 4, 5, 7] {
            run[i] = 2.0 * i as f64 + 1.0;
        }
        imp.repair_run(&mut run);
        for (i, v) in run.iter().enumerate() {
            assert_abs_diff_eq!(*v, 2.0 * i as f64 + 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_interior_spline_matches_fitted_cubic() {
        let imp = imputer(11);
        let mut run = vec![f64::NAN; 11];
        let observed = [(2usize, 1.0), (3, 4.0), (5, 2.0), (7, 6.0)];
        for (i, v) in observed {
            run[i] = v;
        }
        imp.repair_run(&mut run);

        let knots: Vec<(f64, f64)> = observed.iter().map(|&(i, v)| (i as f64, v)).collect();
        let spline = CubicSpline::fit(&knots).unwrap();
        for i in [4usize, 6] {
            assert_abs_diff_eq!(run[i], round_to(spline.evaluate(i as f64), 3), epsilon = 1e-12);
        }
        // Observed knots are preserved exactly.
        for (i, v) in observed {
            assert_eq!(run[i], v);
        }
        // Exterior slots come from the line over the interpolated span.
        let xs: Vec<f64> = (2..=7).map(|i| i as f64).collect();
        let ys: Vec<f64> = run[2..=7].to_vec();
        let line = LinearFit::fit(&xs, &ys).unwrap();
        for i in [0usize, 1, 8, 9, 10] {
            assert_abs_diff_eq!(run[i], round_to(line.predict(i as f64), 3), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_filled_values_carry_three_decimals() {
        let imp = imputer(11);
        let mut run = vec![f64::NAN; 11];
        for (i, v) in [(1usize, 0.1234), (3, 2.7), (6, -1.05), (8, 4.4)] {
            run[i] = v;
        }
        imp.repair_run(&mut run);
        for (i, v) in run.iter().enumerate() {
            if ![1usize, 3, 6, 8].contains(&i) {
                assert_abs_diff_eq!(v * 1000.0, (v * 1000.0).round(), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_repair_matrix_runs_independently() {
        let imp = imputer(3);
        // Row 0: first run sparse (mean), second complete. Row 1: all missing.
        let mut matrix = array![
            [1.0, f64::NAN, f64::NAN, 7.0, 8.0, 9.0],
            [f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN],
        ];
        imp.repair_matrix(&mut matrix).unwrap();
        assert_eq!(matrix[[0, 1]], 1.0);
        assert_eq!(matrix[[0, 2]], 1.0);
        assert_eq!(matrix[[0, 4]], 8.0);
        assert!(matrix[[1, 0]].is_nan());
    }

    #[test]
    fn test_idempotent_on_complete_matrix() {
        let imp = imputer(3);
        let mut matrix = array![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]];
        let before = matrix.clone();
        imp.repair_matrix(&mut matrix).unwrap();
        imp.repair_matrix(&mut matrix).unwrap();
        assert_eq!(matrix, before);
    }

    #[test]
    fn test_misaligned_matrix_rejected() {
        let imp = imputer(3);
        let mut matrix = Array2::<f64>::zeros((1, 7));
        assert!(matches!(
            imp.repair_matrix(&mut matrix),
            Err(ImputeError::MisalignedMatrix {
                width: 7,
                periods: 3
            })
        ));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn test_invalid_period_config(#[case] periods: usize) {
        let result = Imputer::new(ImputeConfig {
            periods,
            ..ImputeConfig::default()
        });
        assert!(matches!(result, Err(ImputeError::PeriodTooShort(_))));
    }

    #[test]
    fn test_invalid_threshold_config() {
        let result = Imputer::new(ImputeConfig {
            min_fit_points: 1,
            ..ImputeConfig::default()
        });
        assert!(matches!(result, Err(ImputeError::ThresholdTooLow(1))));
    }
}
