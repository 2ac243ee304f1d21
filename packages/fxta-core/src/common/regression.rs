//! Least-squares polynomial fit used by the regression indicators.
//!
//! Points are `(x, y)` with `x = 0..n-1`. Internally x is rescaled to
//! `t = x / (n - 1)` so the normal equations stay well conditioned for
//! long windows; `value_at` / `slope_at` take bar offsets.

use crate::error::{IndicatorError, Result};

#[derive(Debug, Clone)]
pub struct PolyFit {
    /// Coefficients in `t`, lowest power first.
    coefficients: Vec<f64>,
    scale: f64,
    std_error: f64,
    max_deviation: f64,
}

impl PolyFit {
    /// Fits a polynomial of `degree` (>= 1) to `ys`.
    pub fn fit(ys: &[f64], degree: usize) -> Result<Self> {
        let n = ys.len();
        if degree == 0 {
            return Err(IndicatorError::invalid("degree", "must be at least 1"));
        }
        if n <= degree {
            return Err(IndicatorError::SingularMatrix { degree, points: n });
        }

        let size = degree + 1;
        let scale = (n - 1) as f64;

        // power sums: sum t^k for k in 0..=2*degree
        let mut t_sums = vec![0.0; 2 * degree + 1];
        let mut rhs = vec![0.0; size];
        for (x, &y) in ys.iter().enumerate() {
            let t = x as f64 / scale;
            let mut p = 1.0;
            for (k, sum) in t_sums.iter_mut().enumerate() {
                *sum += p;
                if k < size {
                    rhs[k] += y * p;
                }
                p *= t;
            }
        }

        let mut matrix: Vec<Vec<f64>> = (0..size)
            .map(|row| (0..size).map(|col| t_sums[row + col]).collect())
            .collect();

        let coefficients = solve(&mut matrix, &mut rhs)
            .ok_or(IndicatorError::SingularMatrix { degree, points: n })?;

        let mut fit = Self {
            coefficients,
            scale,
            std_error: 0.0,
            max_deviation: 0.0,
        };

        let mut sq = 0.0;
        let mut max_dev: f64 = 0.0;
        for (x, &y) in ys.iter().enumerate() {
            let r = y - fit.value_at(x as f64);
            sq += r * r;
            max_dev = max_dev.max(r.abs());
        }
        fit.std_error = (sq / n as f64).sqrt();
        fit.max_deviation = max_dev;

        Ok(fit)
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Coefficients in the rescaled variable `t = x / (n - 1)`.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Fitted value at bar offset `x` (0 = oldest point of the fit).
    pub fn value_at(&self, x: f64) -> f64 {
        let t = x / self.scale;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * t + c)
    }

    /// First derivative per bar at offset `x`.
    pub fn slope_at(&self, x: f64) -> f64 {
        let t = x / self.scale;
        let mut acc = 0.0;
        for (k, c) in self.coefficients.iter().enumerate().skip(1).rev() {
            acc = acc * t + k as f64 * c;
        }
        acc / self.scale
    }

    /// Root mean squared residual.
    pub fn std_error(&self) -> f64 {
        self.std_error
    }

    /// Largest absolute residual.
    pub fn max_deviation(&self) -> f64 {
        self.max_deviation
    }
}

/// Gaussian elimination with partial pivoting. None when singular.
fn solve(a: &mut [Vec<f64>], b: &mut [f64]) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
