//! Vector autoregression in companion form.
//!
//! For `nf` factors and `nl` lags,
//!
//! ```text
//! f[t] = A1 f[t-1] + ... + A_nl f[t-nl] + u[t],   var(u) = V
//! ```
//!
//! The state stacks each factor with `nlx >= nl` of its own lags, factor
//! by factor: slot `g * nlx + l` holds factor `g` at lag `l` (slot 0 is
//! the current value). Extra lags beyond `nl` let measurement equations
//! reach further back (aggregation over several periods).

use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, ArrayViewMut2};

use crate::contract::Dynamics;
use crate::error::SsfError;

/// Coefficients and innovation covariance of a VAR(nl) on `nf` factors.
///
/// `coefficients` is `nf x (nf * nl)`: column `g * nl + l` of row `f` is
/// the weight of factor `g` at lag `l + 1` in the equation of factor `f`.
#[derive(Clone, Debug, PartialEq)]
pub struct VarDescriptor {
    nf: usize,
    nl: usize,
    coefficients: Array2<f64>,
    innovations: Array2<f64>,
}

impl VarDescriptor {
    /// Builds a validated descriptor.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SsfError::InvalidModel`] | `nf` or `nl` is zero, non-finite values, asymmetric `innovations` |
    /// | [`SsfError::DimensionMismatch`] | matrices do not match `nf`, `nl` |
    pub fn new(
        nf: usize,
        nl: usize,
        coefficients: Array2<f64>,
        innovations: Array2<f64>,
    ) -> Result<Self, SsfError> {
        if nf == 0 || nl == 0 {
            return Err(SsfError::InvalidModel {
                reason: "a VAR needs at least one factor and one lag".to_string(),
            });
        }
        check_shape("VAR coefficients", coefficients.dim(), (nf, nf * nl))?;
        check_shape("VAR innovations", innovations.dim(), (nf, nf))?;
        if coefficients.iter().chain(innovations.iter()).any(|v| !v.is_finite()) {
            return Err(SsfError::InvalidModel {
                reason: "VAR parameters must be finite".to_string(),
            });
        }
        for i in 0..nf {
            for j in 0..i {
                if innovations[[i, j]] != innovations[[j, i]] {
                    return Err(SsfError::InvalidModel {
                        reason: "VAR innovation covariance must be symmetric".to_string(),
                    });
                }
            }
        }
        Ok(Self {
            nf,
            nl,
            coefficients,
            innovations,
        })
    }

    /// Independent AR(1) factors `f[t] = rho_g f[t-1] + u[t]` with
    /// uncorrelated innovations of variance `variances[g]`.
    pub fn independent_ar1(rho: &[f64], variances: &[f64]) -> Result<Self, SsfError> {
        if rho.len() != variances.len() {
            return Err(SsfError::DimensionMismatch {
                what: "AR(1) variances",
                expected: rho.len(),
                got: variances.len(),
            });
        }
        let nf = rho.len();
        let coefficients = Array2::from_diag(&Array1::from(rho.to_vec()));
        let innovations = Array2::from_diag(&Array1::from(variances.to_vec()));
        Self::new(nf, 1, coefficients, innovations)
    }

    /// Number of factors.
    pub fn nf(&self) -> usize {
        self.nf
    }

    /// Number of autoregressive lags.
    pub fn nl(&self) -> usize {
        self.nl
    }

    /// `nf x (nf * nl)` coefficient matrix.
    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    /// `nf x nf` innovation covariance.
    pub fn innovations(&self) -> &Array2<f64> {
        &self.innovations
    }

    /// Coefficient of factor `g` at lag `lag` (1-based) in equation `f`.
    pub fn coefficient(&self, f: usize, g: usize, lag: usize) -> f64 {
        self.coefficients[[f, g * self.nl + lag - 1]]
    }
}

fn check_shape(
    what: &'static str,
    got: (usize, usize),
    expected: (usize, usize),
) -> Result<(), SsfError> {
    if got.0 != expected.0 {
        return Err(SsfError::DimensionMismatch {
            what,
            expected: expected.0,
            got: got.0,
        });
    }
    if got.1 != expected.1 {
        return Err(SsfError::DimensionMismatch {
            what,
            expected: expected.1,
            got: got.1,
        });
    }
    Ok(())
}

/// Companion-form [`Dynamics`] of a [`VarDescriptor`] with `nlx` lags per factor.
#[derive(Clone, Debug)]
pub struct VarDynamics {
    desc: VarDescriptor,
    nlx: usize,
}

impl VarDynamics {
    /// Wraps `desc` with `nlx >= nl` lags per factor.
    pub fn new(desc: VarDescriptor, nlx: usize) -> Result<Self, SsfError> {
        if nlx < desc.nl {
            return Err(SsfError::InvalidModel {
                reason: format!("nlx ({nlx}) must be at least the number of lags ({})", desc.nl),
            });
        }
        Ok(Self { desc, nlx })
    }

    /// Underlying VAR.
    pub fn descriptor(&self) -> &VarDescriptor {
        &self.desc
    }

    /// Number of lags kept per factor in the state.
    pub fn nlx(&self) -> usize {
        self.nlx
    }

    /// Number of factors.
    pub fn nf(&self) -> usize {
        self.desc.nf
    }

    /// Number of autoregressive lags.
    pub fn nl(&self) -> usize {
        self.desc.nl
    }

    /// Current values of the factors, `new[f] = Σ A[f, g*nl+l] x[g*nlx+l]`.
    fn heads(&self, x: &ArrayViewMut1<f64>) -> Vec<f64> {
        let (nf, nl, nlx) = (self.desc.nf, self.desc.nl, self.nlx);
        (0..nf)
            .map(|f| {
                let row = self.desc.coefficients.row(f);
                let mut s = 0.0;
                for g in 0..nf {
                    for l in 0..nl {
                        s += row[g * nl + l] * x[g * nlx + l];
                    }
                }
                s
            })
            .collect()
    }
}

impl Dynamics for VarDynamics {
    fn dim(&self) -> usize {
        self.desc.nf * self.nlx
    }

    fn innovations_dim(&self) -> usize {
        self.desc.nf
    }

    fn is_time_invariant(&self) -> bool {
        true
    }

    fn are_innovations_time_invariant(&self) -> bool {
        true
    }

    fn t(&self, _pos: usize, mut out: ArrayViewMut2<f64>) {
        let (nf, nl, nlx) = (self.desc.nf, self.desc.nl, self.nlx);
        out.fill(0.0);
        for f in 0..nf {
            let r = f * nlx;
            for g in 0..nf {
                for l in 0..nl {
                    out[[r, g * nlx + l]] = self.desc.coefficients[[f, g * nl + l]];
                }
            }
            for l in 1..nlx {
                out[[r + l, r + l - 1]] = 1.0;
            }
        }
    }

    fn tx(&self, _pos: usize, mut x: ArrayViewMut1<f64>) {
        let nlx = self.nlx;
        let heads = self.heads(&x);
        for (g, head) in heads.into_iter().enumerate() {
            let start = g * nlx;
            for l in (1..nlx).rev() {
                x[start + l] = x[start + l - 1];
            }
            x[start] = head;
        }
    }

    fn xt(&self, _pos: usize, mut x: ArrayViewMut1<f64>) {
        let (nf, nl, nlx) = (self.desc.nf, self.desc.nl, self.nlx);
        let heads: Vec<f64> = (0..nf).map(|f| x[f * nlx]).collect();
        for h in 0..nf {
            let start = h * nlx;
            for l in 0..nlx - 1 {
                x[start + l] = x[start + l + 1];
            }
            x[start + nlx - 1] = 0.0;
            for l in 0..nl {
                let mut s = 0.0;
                for (f, head) in heads.iter().enumerate() {
                    s += self.desc.coefficients[[f, h * nl + l]] * head;
                }
                x[start + l] += s;
            }
        }
    }

    fn v(&self, _pos: usize, mut out: ArrayViewMut2<f64>) {
        out.fill(0.0);
        self.add_v(0, out);
    }

    fn s(&self, _pos: usize, mut out: ArrayViewMut2<f64>) {
        out.fill(0.0);
        for g in 0..self.desc.nf {
            out[[g * self.nlx, g]] = 1.0;
        }
    }

    fn add_su(&self, _pos: usize, mut x: ArrayViewMut1<f64>, u: ArrayView1<f64>) {
        for (g, ug) in u.iter().enumerate() {
            x[g * self.nlx] += ug;
        }
    }

    fn xs(&self, _pos: usize, x: ArrayView1<f64>, mut out: ArrayViewMut1<f64>) {
        for (g, o) in out.iter_mut().enumerate() {
            *o = x[g * self.nlx];
        }
    }

    fn add_v(&self, _pos: usize, mut p: ArrayViewMut2<f64>) {
        let (nf, nlx) = (self.desc.nf, self.nlx);
        for f in 0..nf {
            for g in 0..nf {
                p[[f * nlx, g * nlx]] += self.desc.innovations[[f, g]];
            }
        }
    }
}
