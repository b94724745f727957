//! Gaussian likelihood from a prediction error decomposition.

use std::f64::consts::PI;

/// Result of one filtering pass.
///
/// `ssq` is the sum of squared standardized residuals `Σ e_t² / h_t`, and
/// `log_determinant` is `Σ ln h_t`. Both are computed with the innovation
/// variance of the model, so the concentrated likelihood re-estimates the
/// scale as `ssq / n`.
#[derive(Clone, Debug, PartialEq)]
pub struct Likelihood {
    ssq: f64,
    log_determinant: f64,
    residuals: Vec<f64>,
    degrees_of_freedom: usize,
}

impl Likelihood {
    /// Creates a likelihood from its components.
    pub fn new(ssq: f64, log_determinant: f64, residuals: Vec<f64>, degrees_of_freedom: usize) -> Self {
        Self {
            ssq,
            log_determinant,
            residuals,
            degrees_of_freedom,
        }
    }

    /// Sum of squared standardized residuals.
    pub fn ssq(&self) -> f64 {
        self.ssq
    }

    /// `Σ ln h_t`.
    pub fn log_determinant(&self) -> f64 {
        self.log_determinant
    }

    /// Standardized one-step-ahead residuals `e_t / sqrt(h_t)`.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Degrees of freedom (number of observations used).
    pub fn degrees_of_freedom(&self) -> usize {
        self.degrees_of_freedom
    }

    /// Number of residuals.
    pub fn n(&self) -> usize {
        self.residuals.len()
    }

    /// Maximum-likelihood scale factor `ssq / df`.
    pub fn sigma2(&self) -> f64 {
        self.ssq / self.degrees_of_freedom as f64
    }

    /// Log-likelihood with the scale concentrated out.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.degrees_of_freedom as f64;
        -0.5 * (n * (2.0 * PI).ln() + n * (self.ssq / n).ln() + n + self.log_determinant)
    }

    /// Log-likelihood at the model's own innovation variance.
    pub fn unconcentrated_log_likelihood(&self) -> f64 {
        let n = self.degrees_of_freedom as f64;
        -0.5 * (n * (2.0 * PI).ln() + self.log_determinant + self.ssq)
    }

    /// Akaike information criterion; `nparams` excludes the scale.
    pub fn aic(&self, nparams: usize) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * (nparams + 1) as f64
    }

    /// Schwarz (Bayesian) information criterion; `nparams` excludes the scale.
    pub fn bic(&self, nparams: usize) -> f64 {
        let n = self.degrees_of_freedom as f64;
        -2.0 * self.log_likelihood() + (nparams + 1) as f64 * n.ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn accessors_round_trip() {
        let ll = Likelihood::new(4.0, 0.5, vec![1.0, -1.0, 1.0, -1.0], 4);
        assert_eq!(ll.ssq(), 4.0);
        assert_eq!(ll.log_determinant(), 0.5);
        assert_eq!(ll.n(), 4);
        assert_eq!(ll.degrees_of_freedom(), 4);
        assert_eq!(ll.sigma2(), 1.0);
    }

    #[test]
    fn concentrated_matches_unconcentrated_at_mle_scale() {
        // With ssq = n the concentrated and unconcentrated forms coincide.
        let ll = Likelihood::new(10.0, 2.0, vec![0.0; 10], 10);
        assert_abs_diff_eq!(
            ll.log_likelihood(),
            ll.unconcentrated_log_likelihood(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn information_criteria() {
        let ll = Likelihood::new(10.0, 0.0, vec![0.0; 10], 10);
        let base = -2.0 * ll.log_likelihood();
        assert_abs_diff_eq!(ll.aic(2), base + 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ll.bic(2), base + 3.0 * 10f64.ln(), epsilon = 1e-12);
    }
}
