//! Cholette benchmarking parameters.

use crate::error::BenchmarkError;

/// Preliminary correction applied before the benchmarking proper.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BiasCorrection {
    /// No correction.
    #[default]
    None,
    /// Shift the series by the mean discrepancy per sub-period.
    Additive,
    /// Scale the series by the ratio of aggregates.
    Multiplicative,
}

/// Parameters of the Cholette method.
///
/// Corrections follow `x*[t] = x[t] + |x[t]|^lambda u[t]` with
/// `u[t] = rho u[t-1] + e[t]`, so `lambda` selects additive (0),
/// proportional (1) or intermediate adjustments and `rho` their
/// persistence.
///
/// # Example
///
/// ```
/// use saga_benchmarking::{BiasCorrection, CholetteSpec};
///
/// let spec = CholetteSpec::new()
///     .with_rho(0.8)
///     .with_lambda(0.5)
///     .with_bias(BiasCorrection::Additive);
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CholetteSpec {
    rho: f64,
    lambda: f64,
    bias: BiasCorrection,
}

impl Default for CholetteSpec {
    fn default() -> Self {
        Self {
            rho: 0.9,
            lambda: 1.0,
            bias: BiasCorrection::None,
        }
    }
}

impl CholetteSpec {
    /// Default parameters (`rho = 0.9`, `lambda = 1`, no bias correction).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the autocorrelation of the corrections.
    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    /// Sets the weighting exponent.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Sets the bias correction.
    pub fn with_bias(mut self, bias: BiasCorrection) -> Self {
        self.bias = bias;
        self
    }

    /// Autocorrelation of the corrections.
    pub fn rho(&self) -> f64 {
        self.rho
    }

    /// Weighting exponent.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Bias correction.
    pub fn bias(&self) -> BiasCorrection {
        self.bias
    }

    /// Checks `|rho| < 1` and `lambda >= 0`.
    pub fn validate(&self) -> Result<(), BenchmarkError> {
        if !(self.rho.abs() < 1.0) {
            return Err(BenchmarkError::InvalidSpec {
                reason: format!("rho must lie strictly between -1 and 1, got {}", self.rho),
            });
        }
        if !(self.lambda >= 0.0) || !self.lambda.is_finite() {
            return Err(BenchmarkError::InvalidSpec {
                reason: format!("lambda must be finite and non-negative, got {}", self.lambda),
            });
        }
        Ok(())
    }

    /// Weight `|x|^lambda` of an observation.
    pub fn weight(&self, x: f64) -> f64 {
        if self.lambda == 0.0 {
            1.0
        } else if self.lambda == 0.5 {
            x.abs().sqrt()
        } else if self.lambda == 1.0 {
            x.abs()
        } else {
            x.abs().powf(self.lambda)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn defaults() {
        let spec = CholetteSpec::default();
        assert_eq!(spec.rho(), 0.9);
        assert_eq!(spec.lambda(), 1.0);
        assert_eq!(spec.bias(), BiasCorrection::None);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn validation() {
        assert!(CholetteSpec::new().with_rho(1.0).validate().is_err());
        assert!(CholetteSpec::new().with_rho(-1.2).validate().is_err());
        assert!(CholetteSpec::new().with_rho(f64::NAN).validate().is_err());
        assert!(CholetteSpec::new().with_lambda(-0.1).validate().is_err());
        assert!(CholetteSpec::new().with_rho(0.0).with_lambda(0.0).validate().is_ok());
    }

    #[test]
    fn weights() {
        assert_eq!(CholetteSpec::new().with_lambda(0.0).weight(-4.0), 1.0);
        assert_eq!(CholetteSpec::new().with_lambda(0.5).weight(-4.0), 2.0);
        assert_eq!(CholetteSpec::new().with_lambda(1.0).weight(-4.0), 4.0);
        assert_abs_diff_eq!(CholetteSpec::new().with_lambda(2.0).weight(3.0), 9.0, epsilon = 1e-12);
    }
}
