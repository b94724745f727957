//! Error types for the saga-arima crate.

use saga_math::MathError;

/// Error type for all fallible operations in the saga-arima crate.
///
/// Covers model construction failures, preconditions of the Kalman
/// likelihood evaluator and numerical divergence during filtering.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArimaError {
    /// Returned when the input data is empty.
    #[error("input data is empty")]
    EmptyData,

    /// Returned when the input data contains non-finite values (NaN or infinity).
    #[error("input data contains non-finite values")]
    NonFiniteData,

    /// Returned when a filter is built on a model that is not stationary.
    #[error("model is not stationary")]
    NonStationaryModel,

    /// Returned when an operator polynomial does not start with 1.
    #[error("{operator} polynomial must have a unit leading coefficient, got {value}")]
    NonUnitLeadingCoefficient {
        /// Which operator was rejected ("AR", "MA", ...).
        operator: &'static str,
        /// Leading coefficient actually provided.
        value: f64,
    },

    /// Returned when a model parameter is out of range.
    #[error("invalid model: {reason}")]
    InvalidModel {
        /// Human-readable description of the violated constraint.
        reason: String,
    },

    /// Returned when the coefficient vector does not match the specification.
    #[error("coefficient count mismatch for {operator}: expected {expected}, got {got}")]
    CoefficientCount {
        /// Which operator was rejected.
        operator: &'static str,
        /// Count implied by the specification.
        expected: usize,
        /// Count actually provided.
        got: usize,
    },

    /// Returned when the prediction-error variance becomes NaN or non-positive.
    #[error("prediction error variance diverged at position {position} (h = {variance})")]
    NumericalDivergence {
        /// Observation index where the recursion broke down.
        position: usize,
        /// Offending variance value.
        variance: f64,
    },

    /// Linear algebra failure while computing autocovariances.
    #[error(transparent)]
    Math(#[from] MathError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_empty_data() {
        let err = ArimaError::EmptyData;
        assert_eq!(err.to_string(), "input data is empty");
    }

    #[test]
    fn error_non_finite_data() {
        let err = ArimaError::NonFiniteData;
        assert_eq!(err.to_string(), "input data contains non-finite values");
    }

    #[test]
    fn error_non_stationary() {
        let err = ArimaError::NonStationaryModel;
        assert_eq!(err.to_string(), "model is not stationary");
    }

    #[test]
    fn error_leading_coefficient() {
        let err = ArimaError::NonUnitLeadingCoefficient {
            operator: "AR",
            value: 2.0,
        };
        assert_eq!(
            err.to_string(),
            "AR polynomial must have a unit leading coefficient, got 2"
        );
    }

    #[test]
    fn error_coefficient_count() {
        let err = ArimaError::CoefficientCount {
            operator: "seasonal MA",
            expected: 1,
            got: 0,
        };
        assert_eq!(
            err.to_string(),
            "coefficient count mismatch for seasonal MA: expected 1, got 0"
        );
    }

    #[test]
    fn error_divergence() {
        let err = ArimaError::NumericalDivergence {
            position: 7,
            variance: -0.5,
        };
        assert_eq!(
            err.to_string(),
            "prediction error variance diverged at position 7 (h = -0.5)"
        );
    }

    #[test]
    fn error_math_transparent() {
        let err = ArimaError::from(MathError::Singular { index: 2 });
        assert_eq!(err.to_string(), "singular linear system (pivot 2)");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<ArimaError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<ArimaError>();
    }
}
