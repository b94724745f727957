//! Theoretical autocovariances of stationary ARMA processes.

use ndarray::Array2;
use saga_math::{Polynomial, linalg};

use crate::error::ArimaError;

/// First `n` coefficients of the MA(∞) expansion `Θ(B) / Φ(B)`.
pub fn psi_weights(ar: &Polynomial, ma: &Polynomial, n: usize) -> Vec<f64> {
    let p = ar.degree();
    let mut psi = vec![0.0; n];
    for j in 0..n {
        let mut v = ma.coefficient(j);
        for i in 1..=p.min(j) {
            v -= ar.coefficient(i) * psi[j - i];
        }
        psi[j] = v;
    }
    psi
}

/// Autocovariances `γ_0..γ_{n-1}` of `Φ(B) y_t = Θ(B) ε_t`, `var(ε) = var`.
///
/// The first `p + 1` values solve the Yule-Walker system corrected for the
/// MA part; higher lags follow the AR recursion.
///
/// # Errors
///
/// [`ArimaError::Math`] when the system is singular, which only happens
/// for operators with a unit root.
pub fn autocovariances(
    ar: &Polynomial,
    ma: &Polynomial,
    var: f64,
    n: usize,
) -> Result<Vec<f64>, ArimaError> {
    let p = ar.degree();
    let q = ma.degree();
    let psi = psi_weights(ar, ma, q + 1);

    // var * sum_{j=k}^{q} θ_j ψ_{j-k}
    let rhs = |k: usize| -> f64 {
        (k..=q)
            .map(|j| ma.coefficient(j) * psi[j - k])
            .sum::<f64>()
            * var
    };

    let mut a = Array2::<f64>::zeros((p + 1, p + 1));
    for k in 0..=p {
        for j in 0..=p {
            a[[k, k.abs_diff(j)]] += ar.coefficient(j);
        }
    }
    let b: Vec<f64> = (0..=p).map(rhs).collect();
    let head = linalg::solve(a.view(), &b)?;

    let mut gamma = Vec::with_capacity(n.max(p + 1));
    gamma.extend(head.iter().copied());
    for k in p + 1..n {
        let mut v = if k <= q { rhs(k) } else { 0.0 };
        for j in 1..=p {
            v -= ar.coefficient(j) * gamma[k - j];
        }
        gamma.push(v);
    }
    gamma.truncate(n);
    Ok(gamma)
}
