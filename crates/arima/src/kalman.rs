//! Kalman likelihood of stationary ARMA models.
//!
//! The filter runs on the companion representation of
//! [`crate::state_space`] and propagates the covariance through the
//! Chandrasekhar recursions instead of the full Riccati equation:
//!
//! ```text
//! C[t]   = P[t] Z'            (gain column, dim)
//! L[t]   = rank-one increment  P[t+1] - P[t] = -L L' / h
//! h[t]   = Z P[t] Z'          (prediction error variance)
//! ```
//!
//! Each step costs `O(dim)`. Once `h` reaches the innovation variance the
//! recursion has converged and the gains are frozen.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use crate::error::ArimaError;
use crate::likelihood::Likelihood;
use crate::model::LinearModel;
use crate::state_space::ArmaStateSpace;

/// Thread-safe count of likelihood evaluations.
///
/// Attach one to several filters with [`ArmaKf::with_counter`] to track
/// how many evaluations an estimation routine performed.
#[derive(Debug, Default)]
pub struct EvaluationCounter {
    count: AtomicU64,
}

impl EvaluationCounter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded evaluations.
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Resets the count to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Exact Gaussian likelihood evaluator for a stationary ARMA model.
///
/// # Example
///
/// ```
/// use saga_arima::{ArmaKf, ArmaModel};
///
/// let model = ArmaModel::from_coefficients(&[-0.5], &[], 1.0).unwrap();
/// let kf = ArmaKf::new(&model).unwrap();
/// let ll = kf.process(&[1.0, 2.0, 1.5, 0.5, -1.0]).unwrap();
/// assert_eq!(ll.n(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct ArmaKf {
    ssf: ArmaStateSpace,
    /// `φ1..φp`.
    phi: Vec<f64>,
    /// `θ1..θq`.
    theta: Vec<f64>,
    var: f64,
    c0: Vec<f64>,
    epsilon: f64,
    counter: Option<Arc<EvaluationCounter>>,
}

impl ArmaKf {
    /// Prepares the filter for `model`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArimaError::NonStationaryModel`] | the AR operator has a root on or inside the unit circle |
    /// | [`ArimaError::Math`] | the autocovariance system is singular |
    pub fn new<M: LinearModel + ?Sized>(model: &M) -> Result<Self, ArimaError> {
        if !model.is_stationary() {
            return Err(ArimaError::NonStationaryModel);
        }
        let ar = model.ar();
        let ma = model.ma();
        let var = model.innovation_variance();
        let ssf = ArmaStateSpace::new(&ar, &ma);
        let c0 = crate::autocovariance::autocovariances(&ar, &ma, var, ssf.dim())?;
        debug!(p = ar.degree(), q = ma.degree(), dim = ssf.dim(), "arma filter ready");
        Ok(Self {
            ssf,
            phi: ar.coefficients()[1..].to_vec(),
            theta: ma.coefficients()[1..].to_vec(),
            var,
            c0,
            epsilon: 0.0,
            counter: None,
        })
    }

    /// Attaches an evaluation counter, incremented by each [`process`](Self::process).
    pub fn with_counter(mut self, counter: Arc<EvaluationCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Sets the convergence threshold on `h - σ²`.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the convergence threshold on `h - σ²`.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    /// Convergence threshold on `h - σ²` (default 0).
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// State dimension `max(p, q + 1)`.
    pub fn dim(&self) -> usize {
        self.ssf.dim()
    }

    /// Runs the exact filter over `y` and returns the likelihood.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArimaError::EmptyData`] | `y` is empty |
    /// | [`ArimaError::NonFiniteData`] | `y` contains NaN or infinity |
    /// | [`ArimaError::NumericalDivergence`] | `h` became NaN or non-positive |
    pub fn process(&self, y: &[f64]) -> Result<Likelihood, ArimaError> {
        validate(y)?;
        if let Some(counter) = &self.counter {
            counter.increment();
        }
        let mut state = FilterState::new(self);
        let mut residuals = Vec::with_capacity(y.len());
        let mut ssq = 0.0;
        let mut logdet = 0.0;
        for (pos, &obs) in y.iter().enumerate() {
            let (e, h) = state.step(self, pos, obs)?;
            let s = e / h.sqrt();
            residuals.push(s);
            ssq += s * s;
            logdet += h.ln();
        }
        Ok(Likelihood::new(ssq, logdet, residuals, y.len()))
    }

    /// Standardized residuals using the exact filter for the first
    /// `max(p, q)` observations and the ARMA difference equation after.
    ///
    /// # Errors
    ///
    /// Same as [`process`](Self::process).
    pub fn fast_filter(&self, y: &[f64]) -> Result<Vec<f64>, ArimaError> {
        validate(y)?;
        let p = self.phi.len();
        let q = self.theta.len();
        let m = p.max(q).min(y.len());

        let mut state = FilterState::new(self);
        let mut raw = Vec::with_capacity(y.len());
        let mut residuals = Vec::with_capacity(y.len());
        for (pos, &obs) in y.iter().enumerate().take(m) {
            let (e, h) = state.step(self, pos, obs)?;
            raw.push(e);
            residuals.push(e / h.sqrt());
        }

        let sigma = self.var.sqrt();
        for t in m..y.len() {
            let mut e = y[t];
            for (k, &phi) in self.phi.iter().enumerate() {
                e += phi * y[t - 1 - k];
            }
            for (k, &theta) in self.theta.iter().enumerate() {
                e -= theta * raw[t - 1 - k];
            }
            raw.push(e);
            residuals.push(e / sigma);
        }
        Ok(residuals)
    }

    /// Schwarz criterion `ln(ssq / n) + nparams·ln(n) / n` from
    /// [`fast_filter`](Self::fast_filter) residuals.
    pub fn fast_processing(&self, y: &[f64], nparams: usize) -> Result<f64, ArimaError> {
        let residuals = self.fast_filter(y)?;
        let n = residuals.len() as f64;
        let ssq: f64 = residuals.iter().map(|e| e * e).sum();
        Ok((ssq / n).ln() + nparams as f64 * n.ln() / n)
    }
}

fn validate(y: &[f64]) -> Result<(), ArimaError> {
    if y.is_empty() {
        return Err(ArimaError::EmptyData);
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ArimaError::NonFiniteData);
    }
    Ok(())
}

/// Per-pass buffers of the Chandrasekhar recursion.
struct FilterState {
    a: Vec<f64>,
    c: Vec<f64>,
    l: Vec<f64>,
    h: f64,
    converged: bool,
}

impl FilterState {
    fn new(kf: &ArmaKf) -> Self {
        let c = kf.c0.clone();
        let mut l = c.clone();
        kf.ssf.tx(&mut l);
        Self {
            a: vec![0.0; c.len()],
            h: c[0],
            c,
            l,
            converged: false,
        }
    }

    /// Processes one observation and returns `(e, h)` for it.
    fn step(&mut self, kf: &ArmaKf, pos: usize, obs: f64) -> Result<(f64, f64), ArimaError> {
        let h = self.h;
        if h.is_nan() || h <= 0.0 {
            return Err(ArimaError::NumericalDivergence {
                position: pos,
                variance: h,
            });
        }
        let e = obs - self.a[0];
        let k = e / h;
        for (a, c) in self.a.iter_mut().zip(&self.c) {
            *a += c * k;
        }
        kf.ssf.tx(&mut self.a);

        if !self.converged {
            let zl = self.l[0];
            let f = zl / h;
            for i in 0..self.c.len() {
                let ci = self.c[i];
                self.c[i] = ci - self.l[i] * f;
                self.l[i] -= ci * f;
            }
            kf.ssf.tx(&mut self.l);
            self.h = h - zl * f;
            if self.h - kf.var <= kf.epsilon {
                trace!(position = pos, "arma filter converged");
                self.converged = true;
            }
        }
        Ok((e, h))
    }
}
