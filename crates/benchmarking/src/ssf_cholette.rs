//! State-space form of the Cholette benchmarking problem.
//!
//! Each benchmarked series `j` gets a correction process
//! `u[j,t] = rho u[j,t-1] + e[j,t]`, and the benchmarked value is
//! `x[j,t] + w[j,t] u[j,t]`. Every constraint becomes an exact
//! measurement equation on the (lagged) corrections,
//!
//! ```text
//! Σ coef * w[var, t-lag] * u[var, t-lag] = target[t] - Σ coef * x[var, t-lag]
//! ```
//!
//! observed only at the periods where it binds. The smoothed corrections
//! are the minimum-norm adjustments satisfying all constraints.

use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};
use saga_ssf::{
    CovarianceCache, KalmanSmoother, Loading, Measurements, SmootherConfig, Ssf,
    SteadyStateInitialization, VarDescriptor, VarDynamics,
};
use tracing::debug;

use crate::error::BenchmarkError;

/// One term `coef * u[var, t - lag]` of a constraint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Term {
    /// Benchmarked series.
    pub var: usize,
    /// Lag in periods.
    pub lag: usize,
    /// Coefficient.
    pub coef: f64,
}

/// Time-varying loading of one constraint on the weighted corrections.
#[derive(Clone, Debug)]
pub struct CholetteLoading {
    terms: Vec<Term>,
    nlx: usize,
    weights: Arc<Array2<f64>>,
}

impl CholetteLoading {
    fn entries(&self, pos: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.terms.iter().filter_map(move |t| {
            (pos >= t.lag).then(|| (t.var * self.nlx + t.lag, t.coef * self.weights[[pos - t.lag, t.var]]))
        })
    }
}

impl Loading for CholetteLoading {
    fn z(&self, pos: usize, mut out: ArrayViewMut1<f64>) {
        out.fill(0.0);
        for (i, w) in self.entries(pos) {
            out[i] += w;
        }
    }

    fn zx(&self, pos: usize, x: ArrayView1<f64>) -> f64 {
        self.entries(pos).map(|(i, w)| w * x[i]).sum()
    }

    fn zvz(&self, pos: usize, v: ArrayView2<f64>) -> f64 {
        let mut s = 0.0;
        for (i, wi) in self.entries(pos) {
            for (j, wj) in self.entries(pos) {
                s += wi * wj * v[[i, j]];
            }
        }
        s
    }

    fn vp_zd_z(&self, pos: usize, mut v: ArrayViewMut2<f64>, d: f64) {
        for (i, wi) in self.entries(pos) {
            for (j, wj) in self.entries(pos) {
                v[[i, j]] += d * wi * wj;
            }
        }
    }

    fn xp_zd(&self, pos: usize, mut x: ArrayViewMut1<f64>, d: f64) {
        for (i, w) in self.entries(pos) {
            x[i] += d * w;
        }
    }
}

/// Exact constraint equations of a benchmarking system.
#[derive(Clone, Debug)]
pub struct CholetteMeasurements {
    loadings: Vec<CholetteLoading>,
}

impl CholetteMeasurements {
    /// Loadings of `equations` on a state of `weights.ncols()` corrections
    /// with `nlx` lags each.
    pub fn new(equations: Vec<Vec<Term>>, nlx: usize, weights: Arc<Array2<f64>>) -> Self {
        let loadings = equations
            .into_iter()
            .map(|terms| CholetteLoading {
                terms,
                nlx,
                weights: Arc::clone(&weights),
            })
            .collect();
        Self { loadings }
    }
}

impl Measurements for CholetteMeasurements {
    fn count(&self) -> usize {
        self.loadings.len()
    }

    fn loading(&self, i: usize) -> &dyn Loading {
        &self.loadings[i]
    }

    fn error_variance(&self, _pos: usize, _i: usize) -> f64 {
        0.0
    }

    fn is_time_invariant(&self) -> bool {
        false
    }
}

/// Assembled benchmarking problem on a common domain.
#[derive(Debug)]
pub(crate) struct CholetteSystem {
    /// `n x nvars` weights `|x|^lambda`.
    pub weights: Array2<f64>,
    /// Constraint equations.
    pub equations: Vec<Vec<Term>>,
    /// `n x equations.len()` residual targets, NaN where an equation does not bind.
    pub targets: Array2<f64>,
}

impl CholetteSystem {
    /// Largest lag used by the equations, plus one.
    fn nlx(&self) -> usize {
        self.equations
            .iter()
            .flatten()
            .map(|t| t.lag + 1)
            .max()
            .unwrap_or(1)
    }

    /// Smoothed weighted corrections `w[t,j] u[t,j]` (`n x nvars`).
    pub fn solve(self, rho: f64, cache: Option<&CovarianceCache>) -> Result<Array2<f64>, BenchmarkError> {
        let (n, nvars) = self.weights.dim();
        let nlx = self.nlx();
        let desc = VarDescriptor::independent_ar1(&vec![rho; nvars], &vec![1.0; nvars])?;
        let dynamics = VarDynamics::new(desc, nlx)?;
        let initialization = match cache {
            Some(cache) => SteadyStateInitialization::cached(&dynamics, cache)?,
            None => SteadyStateInitialization::new(&dynamics)?,
        };
        let weights = Arc::new(self.weights);
        let measurements = CholetteMeasurements::new(self.equations.clone(), nlx, Arc::clone(&weights));
        let ssf = Ssf::new(dynamics, measurements, initialization)?;

        let smoother = KalmanSmoother::new(SmootherConfig::default())?;
        let smoothed = smoother.smooth(&ssf, self.targets.view())?;
        debug!(
            n,
            nvars,
            nlx,
            binding = smoothed.summary().observations,
            redundant = smoothed.summary().skipped,
            "benchmarking system solved"
        );

        let states = smoothed.states();
        let corrections = Array2::from_shape_fn((n, nvars), |(t, j)| weights[[t, j]] * states[[t, j * nlx]]);
        check_feasible(&self.equations, self.targets.view(), corrections.view())?;
        Ok(corrections)
    }
}

/// Fails when a binding equation is not met by `corrections`.
///
/// The smoother drops equations whose loading vanishes (all weights zero)
/// or that are implied by earlier ones; a dropped equation with a non-zero
/// residual cannot be satisfied.
fn check_feasible(
    equations: &[Vec<Term>],
    targets: ArrayView2<f64>,
    corrections: ArrayView2<f64>,
) -> Result<(), BenchmarkError> {
    let scale = targets
        .iter()
        .filter(|v| v.is_finite())
        .fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = FEASIBILITY_TOLERANCE * scale;
    for (equation, terms) in equations.iter().enumerate() {
        for (position, &target) in targets.column(equation).iter().enumerate() {
            if target.is_nan() {
                continue;
            }
            let met: f64 = terms
                .iter()
                .filter(|term| position >= term.lag)
                .map(|term| term.coef * corrections[[position - term.lag, term.var]])
                .sum();
            let residual = target - met;
            if residual.abs() > tolerance {
                return Err(BenchmarkError::Infeasible {
                    equation,
                    position,
                    residual,
                });
            }
        }
    }
    Ok(())
}

const FEASIBILITY_TOLERANCE: f64 = 1e-6;
