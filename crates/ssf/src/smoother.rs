//! Kalman filter and fixed-interval smoother on the state-space contract.
//!
//! Multivariate observations are processed one equation at a time
//! (univariate treatment), which requires a diagonal measurement error
//! covariance and lets missing values be skipped individually. Equations
//! whose prediction error variance vanishes (exact, redundant constraints)
//! are skipped as well.
//!
//! The backward pass uses the state smoothing recursion
//!
//! ```text
//! r[t,i-1] = r[t,i] + Z[t,i]' (v[t,i] - M[t,i]' r[t,i]) / F[t,i]
//! r[t-1,p] = T[t-1]' r[t,0]
//! â[t]     = a[t] + P[t] r[t,0]
//! ```
//!
//! with `M = P Z'`, so only `XT` and `x + d Z` are needed.

use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use saga_math::linalg;
use tracing::debug;

use crate::contract::{Dynamics, Initialization, Measurements};
use crate::error::SsfError;
use crate::model::Ssf;

/// Tuning of [`KalmanSmoother`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmootherConfig {
    epsilon: f64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self { epsilon: 1e-9 }
    }
}

impl SmootherConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative threshold under which a prediction error variance is
    /// treated as zero and its equation skipped.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Relative zero threshold on prediction error variances.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Checks that the threshold is finite and non-negative.
    pub fn validate(&self) -> Result<(), SsfError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(SsfError::InvalidModel {
                reason: format!("smoother epsilon must be finite and non-negative, got {}", self.epsilon),
            });
        }
        Ok(())
    }
}

/// Summary of a forward pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterSummary {
    /// Gaussian log-likelihood of the used observations.
    pub log_likelihood: f64,
    /// Number of equations that entered the likelihood.
    pub observations: usize,
    /// Number of non-missing equations skipped because `F` vanished.
    pub skipped: usize,
}

/// Smoothed state means.
#[derive(Clone, Debug)]
pub struct SmoothedStates {
    states: Array2<f64>,
    summary: FilterSummary,
}

impl SmoothedStates {
    /// `n x dim` smoothed means.
    pub fn states(&self) -> &Array2<f64> {
        &self.states
    }

    /// Smoothed path of state component `j`.
    pub fn component(&self, j: usize) -> Array1<f64> {
        self.states.column(j).to_owned()
    }

    /// Log-likelihood from the forward pass.
    pub fn log_likelihood(&self) -> f64 {
        self.summary.log_likelihood
    }

    /// Forward pass summary.
    pub fn summary(&self) -> FilterSummary {
        self.summary
    }
}

/// Innovation of one equation kept for the backward pass.
struct Innovation {
    equation: usize,
    v: f64,
    f: f64,
    m: Array1<f64>,
}

/// Quantities stored by the forward pass at one position.
struct Step {
    a: Array1<f64>,
    p: Array2<f64>,
    innovations: Vec<Innovation>,
}

/// Univariate Kalman filter and fixed-interval state smoother.
#[derive(Clone, Copy, Debug, Default)]
pub struct KalmanSmoother {
    config: SmootherConfig,
}

impl KalmanSmoother {
    /// Creates a smoother with `config`.
    pub fn new(config: SmootherConfig) -> Result<Self, SsfError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Runs the forward pass only.
    pub fn filter<D, M, I>(&self, ssf: &Ssf<D, M, I>, data: ArrayView2<f64>) -> Result<FilterSummary, SsfError>
    where
        D: Dynamics,
        M: Measurements,
        I: Initialization,
    {
        self.forward(ssf, data, false).map(|(summary, _)| summary)
    }

    /// Runs the forward and backward passes.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SsfError::DimensionMismatch`] | `data` does not have one column per equation |
    /// | [`SsfError::NumericalDivergence`] | a prediction error variance is NaN or clearly negative |
    #[tracing::instrument(skip(self, ssf, data), fields(n = data.nrows(), dim = ssf.dim()))]
    pub fn smooth<D, M, I>(&self, ssf: &Ssf<D, M, I>, data: ArrayView2<f64>) -> Result<SmoothedStates, SsfError>
    where
        D: Dynamics,
        M: Measurements,
        I: Initialization,
    {
        let (summary, steps) = self.forward(ssf, data, true)?;
        let n = steps.len();
        let dim = ssf.dim();
        let mut states = Array2::zeros((n, dim));
        let mut r = Array1::<f64>::zeros(dim);
        for (t, step) in steps.iter().enumerate().rev() {
            for inn in step.innovations.iter().rev() {
                let loading = ssf.measurements.loading(inn.equation);
                let d = (inn.v - inn.m.dot(&r)) / inn.f;
                loading.xp_zd(t, r.view_mut(), d);
            }
            let mut row = states.row_mut(t);
            row.assign(&step.a);
            row += &step.p.dot(&r);
            if t > 0 {
                ssf.dynamics.xt(t - 1, r.view_mut());
            }
        }
        debug!(
            observations = summary.observations,
            skipped = summary.skipped,
            log_likelihood = summary.log_likelihood,
            "smoothing done"
        );
        Ok(SmoothedStates { states, summary })
    }

    fn forward<D, M, I>(
        &self,
        ssf: &Ssf<D, M, I>,
        data: ArrayView2<f64>,
        store: bool,
    ) -> Result<(FilterSummary, Vec<Step>), SsfError>
    where
        D: Dynamics,
        M: Measurements,
        I: Initialization,
    {
        let neq = ssf.measurements.count();
        if data.ncols() != neq {
            return Err(SsfError::DimensionMismatch {
                what: "data columns",
                expected: neq,
                got: data.ncols(),
            });
        }
        let dim = ssf.dim();
        let mut a = Array1::zeros(dim);
        ssf.initialization.a0(a.view_mut());
        let mut p = Array2::zeros((dim, dim));
        ssf.initialization.pf0(p.view_mut());

        let mut steps = Vec::with_capacity(if store { data.nrows() } else { 0 });
        let mut summary = FilterSummary {
            log_likelihood: 0.0,
            observations: 0,
            skipped: 0,
        };
        let mut z = Array1::zeros(dim);
        let mut m = Array1::zeros(dim);

        for (t, y) in data.axis_iter(Axis(0)).enumerate() {
            let mut innovations = Vec::new();
            let (a_pred, p_pred) = if store {
                (Some(a.clone()), Some(p.clone()))
            } else {
                (None, None)
            };
            for (i, &obs) in y.iter().enumerate() {
                if obs.is_nan() {
                    continue;
                }
                let loading = ssf.measurements.loading(i);
                loading.zm(t, p.view(), m.view_mut());
                let zpz = loading.zx(t, m.view());
                let f = zpz + ssf.measurements.error_variance(t, i);

                loading.z(t, z.view_mut());
                let zz = z.dot(&z);
                let scale = p.diag().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
                let threshold = self.config.epsilon * (1.0 + scale * zz);
                if f.is_nan() || f < -threshold {
                    return Err(SsfError::NumericalDivergence {
                        position: t,
                        variance: f,
                    });
                }
                if f <= threshold {
                    summary.skipped += 1;
                    continue;
                }

                let v = obs - loading.zx(t, a.view());
                a.scaled_add(v / f, &m);
                for r in 0..dim {
                    let mr = m[r] / f;
                    if mr == 0.0 {
                        continue;
                    }
                    for c in 0..dim {
                        p[[r, c]] -= mr * m[c];
                    }
                }
                summary.log_likelihood -= 0.5 * ((2.0 * PI).ln() + f.ln() + v * v / f);
                summary.observations += 1;
                if store {
                    innovations.push(Innovation {
                        equation: i,
                        v,
                        f,
                        m: m.clone(),
                    });
                }
            }
            if let (Some(a_pred), Some(p_pred)) = (a_pred, p_pred) {
                steps.push(Step {
                    a: a_pred,
                    p: p_pred,
                    innovations,
                });
            }
            ssf.dynamics.tx(t, a.view_mut());
            ssf.dynamics.tvt(t, p.view_mut());
            ssf.dynamics.add_v(t, p.view_mut());
            linalg::symmetrize(p.view_mut());
        }
        Ok((summary, steps))
    }
}
