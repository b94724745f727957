//! ARMA state-space representation used by the Kalman likelihood.
//!
//! The state holds the current observation and its forecasts:
//!
//! ```text
//! a[t]   = (y[t], y[t+1|t], ..., y[t+r-1|t])'
//! a[t+1] = T * a[t] + R * e[t+1]
//! y[t]   = a[t][0]
//! ```
//!
//! with `r = max(p, q + 1)`, `T` the companion matrix of the AR operator
//! (super-diagonal ones, last row `-φ_r .. -φ_1`) and `R` the first `r`
//! psi-weights.

use ndarray::{Array1, Array2, Axis};
use saga_math::Polynomial;

use crate::autocovariance;

/// Companion-form state space of an ARMA(p, q) model.
#[derive(Clone, Debug)]
pub struct ArmaStateSpace {
    r: usize,
    /// `-φ_1..-φ_p`, the regression form of the AR operator.
    a: Vec<f64>,
    r_vec: Array1<f64>,
}

impl ArmaStateSpace {
    /// Builds the representation from the AR and MA operators.
    pub fn new(ar: &Polynomial, ma: &Polynomial) -> Self {
        let p = ar.degree();
        let q = ma.degree();
        let r = p.max(q + 1);
        let a: Vec<f64> = ar.coefficients()[1..].iter().map(|x| -x).collect();
        let r_vec = Array1::from(autocovariance::psi_weights(ar, ma, r));
        Self { r, a, r_vec }
    }

    /// State dimension `r = max(p, q + 1)`.
    pub fn dim(&self) -> usize {
        self.r
    }

    /// Applies `T` in place: shifts the forecasts up by one slot and
    /// writes the AR combination into the last one.
    pub fn tx(&self, x: &mut [f64]) {
        let r = self.r;
        let mut last = 0.0;
        for (k, &ak) in self.a.iter().enumerate() {
            last += ak * x[r - 1 - k];
        }
        x.copy_within(1..r, 0);
        x[r - 1] = last;
    }

    /// Dense transition matrix `T` (r x r).
    pub fn t(&self) -> Array2<f64> {
        let r = self.r;
        let mut t = Array2::zeros((r, r));
        for i in 0..r - 1 {
            t[[i, i + 1]] = 1.0;
        }
        for (k, &ak) in self.a.iter().enumerate() {
            t[[r - 1, r - 1 - k]] = ak;
        }
        t
    }

    /// Noise input vector `R = (ψ_0, ..., ψ_{r-1})`.
    pub fn r_vec(&self) -> &Array1<f64> {
        &self.r_vec
    }

    /// Rank-one `R R'`.
    pub fn rrt(&self) -> Array2<f64> {
        let r_col = self.r_vec.view().insert_axis(Axis(1));
        let r_row = self.r_vec.view().insert_axis(Axis(0));
        r_col.dot(&r_row)
    }
}
