//! Error types for the saga-ssf crate.

use saga_math::MathError;

/// Error type for all fallible operations in the saga-ssf crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SsfError {
    /// Returned when a model or data block has the wrong shape.
    #[error("dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which object was checked.
        what: &'static str,
        /// Expected size.
        expected: usize,
        /// Size actually provided.
        got: usize,
    },

    /// Returned when a model description is inconsistent.
    #[error("invalid model: {reason}")]
    InvalidModel {
        /// Human-readable description of the violated constraint.
        reason: String,
    },

    /// Returned when the steady-state covariance equation has no unique solution.
    #[error("steady-state covariance system is singular")]
    Singular,

    /// Returned when a prediction error variance becomes NaN or negative.
    #[error("prediction error variance diverged at position {position} (f = {variance})")]
    NumericalDivergence {
        /// Time index where the recursion broke down.
        position: usize,
        /// Offending variance value.
        variance: f64,
    },

    /// Linear algebra failure outside the steady-state solve.
    #[error(transparent)]
    Math(#[from] MathError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_dimension_mismatch() {
        let err = SsfError::DimensionMismatch {
            what: "state",
            expected: 4,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch for state: expected 4, got 3"
        );
    }

    #[test]
    fn error_invalid_model() {
        let err = SsfError::InvalidModel {
            reason: "nlx must be at least nl".to_string(),
        };
        assert_eq!(err.to_string(), "invalid model: nlx must be at least nl");
    }

    #[test]
    fn error_singular() {
        assert_eq!(
            SsfError::Singular.to_string(),
            "steady-state covariance system is singular"
        );
    }

    #[test]
    fn error_divergence() {
        let err = SsfError::NumericalDivergence {
            position: 3,
            variance: -1.0,
        };
        assert_eq!(
            err.to_string(),
            "prediction error variance diverged at position 3 (f = -1)"
        );
    }

    #[test]
    fn error_math_transparent() {
        let err = SsfError::from(MathError::NotSquare { rows: 2, cols: 3 });
        assert_eq!(err.to_string(), "matrix is not square (2x3)");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<SsfError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<SsfError>();
    }
}
