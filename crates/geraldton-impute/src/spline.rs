//! Natural cubic spline interpolation.
//!
//! Fits a C²-continuous piecewise cubic through observed (x, y) knots with
//! natural boundary conditions (zero second derivative at both ends). The
//! second derivatives are obtained from the standard tridiagonal system
//! solved with the Thomas algorithm.

/// A fitted natural cubic spline.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative of the spline at each knot.
    second_derivs: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural cubic spline through the given knots.
    ///
    /// Returns `None` when fewer than two knots are supplied or the x values
    /// are not strictly increasing.
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        let n = points.len();
        if n < 2 {
            return None;
        }
        if points.windows(2).any(|w| w[1].0 <= w[0].0) {
            return None;
        }

        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

        let mut second_derivs = vec![0.0; n];
        if n > 2 {
            // Tridiagonal system over the n-2 interior knots.
            let m = n - 2;
            let mut sub = vec![0.0; m];
            let mut diag = vec![0.0; m];
            let mut sup = vec![0.0; m];
            let mut rhs = vec![0.0; m];
            for i in 0..m {
                let h0 = xs[i + 1] - xs[i];
                let h1 = xs[i + 2] - xs[i + 1];
                sub[i] = h0;
                diag[i] = 2.0 * (h0 + h1);
                sup[i] = h1;
                rhs[i] = 6.0 * ((ys[i + 2] - ys[i + 1]) / h1 - (ys[i + 1] - ys[i]) / h0);
            }

            // Thomas algorithm: forward sweep, then back substitution.
            for i in 1..m {
                let w = sub[i] / diag[i - 1];
                diag[i] -= w * sup[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }
            second_derivs[m] = rhs[m - 1] / diag[m - 1];
            for i in (1..m).rev() {
                second_derivs[i] = (rhs[i - 1] - sup[i - 1] * second_derivs[i + 1]) / diag[i - 1];
            }
        }

        Some(Self {
            xs,
            ys,
            second_derivs,
        })
    }

    /// Evaluate the spline at `x`.
    ///
    /// Outside the knot range the end segment's cubic is extended; the
    /// imputation policy only queries interior points.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        // Segment index: last k with xs[k] <= x, clamped to a valid segment.
        let k = self
            .xs
            .partition_point(|&knot| knot <= x)
            .saturating_sub(1)
            .min(n - 2);

        let h = self.xs[k + 1] - self.xs[k];
        let a = (self.xs[k + 1] - x) / h;
        let b = (x - self.xs[k]) / h;
        let (m0, m1) = (self.second_derivs[k], self.second_derivs[k + 1]);

        a * self.ys[k]
            + b * self.ys[k + 1]
            + ((a.powi(3) - a) * m0 + (b.powi(3) - b) * m1) * h * h / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_passes_through_knots() {
        let points = [(0.0, 1.0), (2.0, -1.0), (3.0, 4.0), (6.0, 0.5)];
        let spline = CubicSpline::fit(&points).unwrap();
        for (x, y) in points {
            assert_abs_diff_eq!(spline.evaluate(x), y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_linear_data_stays_linear() {
        // Collinear knots have zero curvature everywhere, so interior
        // evaluations must sit exactly on the line.
        let points: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let spline = CubicSpline::fit(&points).unwrap();
        for x in [0.5, 1.5, 2.25, 3.75] {
            assert_abs_diff_eq!(spline.evaluate(x), 2.0 * x + 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_two_knots_reduce_to_line() {
        let spline = CubicSpline::fit(&[(1.0, 1.0), (3.0, 5.0)]).unwrap();
        assert_abs_diff_eq!(spline.evaluate(2.0), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_degenerate_input() {
        assert!(CubicSpline::fit(&[(0.0, 1.0)]).is_none());
        assert!(CubicSpline::fit(&[(0.0, 1.0), (0.0, 2.0)]).is_none());
        assert!(CubicSpline::fit(&[(1.0, 1.0), (0.0, 2.0)]).is_none());
    }

    #[test]
    fn test_symmetric_hump() {
        let points = [(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)];
        let spline = CubicSpline::fit(&points).unwrap();
        // Symmetry of knots implies symmetry of the natural spline.
        assert_abs_diff_eq!(spline.evaluate(0.5), spline.evaluate(1.5), epsilon = 1e-10);
        assert!(spline.evaluate(0.5) > 0.0);
    }
}
