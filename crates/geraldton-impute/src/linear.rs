//! Ordinary least-squares line fitting for boundary extrapolation.

/// A fitted `y = slope * x + intercept` line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope of the fitted line.
    pub slope: f64,
    /// Intercept of the fitted line.
    pub intercept: f64,
}

impl LinearFit {
    /// Fit a line through `(xs[i], ys[i])` by ordinary least squares.
    ///
    /// Returns `None` with fewer than two points, mismatched lengths, or
    /// zero variance in x.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len();
        if n < 2 || ys.len() != n {
            return None;
        }
        let nf = n as f64;
        let mean_x = xs.iter().sum::<f64>() / nf;
        let mean_y = ys.iter().sum::<f64>() / nf;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (&x, &y) in xs.iter().zip(ys) {
            sxx += (x - mean_x) * (x - mean_x);
            sxy += (x - mean_x) * (y - mean_y);
        }
        if sxx == 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    /// Predicted value at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_exact_line_recovered() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys: Vec<f64> = xs.iter().map(|x| -0.5 * x + 2.0).collect();
        let fit = LinearFit::fit(&xs, &ys).unwrap();
        assert_abs_diff_eq!(fit.slope, -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.intercept, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.predict(10.0), -3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_noisy_fit_balances_residuals() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.1, 0.9, 2.1, 2.9];
        let fit = LinearFit::fit(&xs, &ys).unwrap();
        let residual_sum: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(&x, &y)| y - fit.predict(x))
            .sum();
        assert_abs_diff_eq!(residual_sum, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(LinearFit::fit(&[1.0], &[2.0]).is_none());
        assert!(LinearFit::fit(&[1.0, 1.0], &[2.0, 3.0]).is_none());
        assert!(LinearFit::fit(&[1.0, 2.0], &[2.0]).is_none());
    }
}
