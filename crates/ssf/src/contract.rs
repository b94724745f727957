//! Contract between state-space models and the algorithms running on them.
//!
//! A model is the triplet [`Dynamics`] / [`Measurements`] /
//! [`Initialization`]:
//!
//! ```text
//! a[t+1] = T[t] a[t] + S[t] u[t],      var(S u) = V[t]
//! y[t,i] = Z[t,i] a[t] + e[t,i],       var(e[t,i]) = h[t,i]
//! a[0] ~ N(a0, Pf0)
//! ```
//!
//! Operators are exposed as matrix-free products so that sparse structures
//! (companion blocks, aggregation patterns) never materialise dense
//! matrices on the hot path.

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

/// State transition of a linear Gaussian model.
pub trait Dynamics: Send + Sync {
    /// State dimension.
    fn dim(&self) -> usize;

    /// Dimension of the innovations `u`.
    fn innovations_dim(&self) -> usize;

    /// Returns `true` when `T` does not depend on the position.
    fn is_time_invariant(&self) -> bool;

    /// Returns `true` when `S` and `V` do not depend on the position.
    fn are_innovations_time_invariant(&self) -> bool;

    /// Writes the dense transition matrix. `out` is overwritten.
    fn t(&self, pos: usize, out: ArrayViewMut2<f64>);

    /// `x <- T x`.
    fn tx(&self, pos: usize, x: ArrayViewMut1<f64>);

    /// `x <- x T` (i.e. `x <- T' x`).
    fn xt(&self, pos: usize, x: ArrayViewMut1<f64>);

    /// Writes the innovation covariance `V = S var(u) S'`. `out` is overwritten.
    fn v(&self, pos: usize, out: ArrayViewMut2<f64>);

    /// Writes the innovation loading `S` (`dim x innovations_dim`). `out` is overwritten.
    fn s(&self, pos: usize, out: ArrayViewMut2<f64>);

    /// `x <- x + S u`.
    fn add_su(&self, pos: usize, x: ArrayViewMut1<f64>, u: ArrayView1<f64>);

    /// `out <- x S`.
    fn xs(&self, pos: usize, x: ArrayView1<f64>, out: ArrayViewMut1<f64>);

    /// `p <- p + V`.
    fn add_v(&self, pos: usize, p: ArrayViewMut2<f64>);

    /// `p <- T p T'`.
    fn tvt(&self, pos: usize, mut p: ArrayViewMut2<f64>) {
        for col in p.columns_mut() {
            self.tx(pos, col);
        }
        for row in p.rows_mut() {
            self.tx(pos, row);
        }
    }
}

/// One row `Z[t,i]` of the measurement equation.
pub trait Loading: Send + Sync {
    /// Writes the dense row. `out` is overwritten.
    fn z(&self, pos: usize, out: ArrayViewMut1<f64>);

    /// `Z x`.
    fn zx(&self, pos: usize, x: ArrayView1<f64>) -> f64;

    /// `Z V Z'`.
    fn zvz(&self, pos: usize, v: ArrayView2<f64>) -> f64;

    /// `V <- V + d Z'Z`.
    fn vp_zd_z(&self, pos: usize, v: ArrayViewMut2<f64>, d: f64);

    /// `x <- x + d Z`.
    fn xp_zd(&self, pos: usize, x: ArrayViewMut1<f64>, d: f64);

    /// `out[i] <- Z m[i, ..]` for every row of `m`.
    fn zm(&self, pos: usize, m: ArrayView2<f64>, mut out: ArrayViewMut1<f64>) {
        for (o, row) in out.iter_mut().zip(m.rows()) {
            *o = self.zx(pos, row);
        }
    }
}

/// Set of measurement equations observed at each position.
pub trait Measurements: Send + Sync {
    /// Number of equations (columns of the data).
    fn count(&self) -> usize;

    /// Loading of equation `i`.
    fn loading(&self, i: usize) -> &dyn Loading;

    /// Variance of the measurement error of equation `i`.
    fn error_variance(&self, pos: usize, i: usize) -> f64;

    /// Returns `true` when loadings and error variances do not depend on the position.
    fn is_time_invariant(&self) -> bool;
}

/// Distribution of the initial state.
pub trait Initialization: Send + Sync {
    /// State dimension.
    fn dim(&self) -> usize;

    /// Writes the initial mean. `out` is overwritten.
    fn a0(&self, out: ArrayViewMut1<f64>);

    /// Writes the initial covariance. `out` is overwritten.
    fn pf0(&self, out: ArrayViewMut2<f64>);
}
