//! Error types for the saga-benchmarking crate.

use saga_ssf::SsfError;

/// Error type for all fallible operations in the saga-benchmarking crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BenchmarkError {
    /// Returned when a constraint names a series that was not provided.
    #[error("unknown series '{name}'")]
    UnknownSeries {
        /// Name of the missing series.
        name: String,
    },

    /// Returned when a constraint cannot be parsed or is malformed.
    #[error("invalid constraint '{constraint}': {reason}")]
    InvalidConstraint {
        /// Constraint text.
        constraint: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Returned when a total appears among its own components.
    #[error("series '{name}' is both the total and a component of one constraint")]
    SelfReference {
        /// Offending series.
        name: String,
    },

    /// Returned when a total of one constraint is a component of another.
    #[error("series '{name}' is a total and a component of contemporaneous constraints")]
    CircularConstraint {
        /// Offending series.
        name: String,
    },

    /// Returned when a series carries more than one temporal constraint.
    #[error("series '{name}' has several temporal constraints")]
    DuplicateConstraint {
        /// Offending series.
        name: String,
    },

    /// Returned when frequencies cannot be combined.
    #[error("incompatible frequencies for '{name}': {detail} is not a multiple of {aggregate}")]
    IncompatibleFrequency {
        /// Series involved.
        name: String,
        /// Periods per year of the detailed series.
        detail: usize,
        /// Periods per year of the aggregate or reference series.
        aggregate: usize,
    },

    /// Returned when the series of a system share no common period.
    #[error("series have no common period")]
    EmptyDomain,

    /// Returned when a series to benchmark has missing values in the common domain.
    #[error("series '{name}' has missing values")]
    MissingValues {
        /// Offending series.
        name: String,
    },

    /// Returned when a benchmarking parameter is out of range.
    #[error("invalid specification: {reason}")]
    InvalidSpec {
        /// Human-readable description of the violated constraint.
        reason: String,
    },

    /// Returned when a binding constraint cannot be met, e.g. because every
    /// series it involves has a zero weight at that period.
    #[error("constraint {equation} cannot be met at position {position} (residual {residual})")]
    Infeasible {
        /// Index of the constraint equation.
        equation: usize,
        /// Position in the benchmarked domain.
        position: usize,
        /// Part of the target left unmet.
        residual: f64,
    },

    /// Failure of the underlying state-space computation.
    #[error(transparent)]
    Ssf(#[from] SsfError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_unknown_series() {
        let err = BenchmarkError::UnknownSeries {
            name: "b".to_string(),
        };
        assert_eq!(err.to_string(), "unknown series 'b'");
    }

    #[test]
    fn error_invalid_constraint() {
        let err = BenchmarkError::InvalidConstraint {
            constraint: "t = ".to_string(),
            reason: "empty right-hand side".to_string(),
        };
        assert_eq!(err.to_string(), "invalid constraint 't = ': empty right-hand side");
    }

    #[test]
    fn error_circular() {
        let err = BenchmarkError::CircularConstraint {
            name: "a".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "series 'a' is a total and a component of contemporaneous constraints"
        );
    }

    #[test]
    fn error_frequency() {
        let err = BenchmarkError::IncompatibleFrequency {
            name: "x".to_string(),
            detail: 12,
            aggregate: 5,
        };
        assert_eq!(
            err.to_string(),
            "incompatible frequencies for 'x': 12 is not a multiple of 5"
        );
    }

    #[test]
    fn error_empty_domain() {
        assert_eq!(BenchmarkError::EmptyDomain.to_string(), "series have no common period");
    }

    #[test]
    fn error_infeasible() {
        let err = BenchmarkError::Infeasible {
            equation: 1,
            position: 3,
            residual: 2.5,
        };
        assert_eq!(err.to_string(), "constraint 1 cannot be met at position 3 (residual 2.5)");
    }

    #[test]
    fn error_ssf_transparent() {
        let err = BenchmarkError::from(SsfError::Singular);
        assert_eq!(err.to_string(), "steady-state covariance system is singular");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<BenchmarkError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<BenchmarkError>();
    }
}
