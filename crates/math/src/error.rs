//! Error types for the saga-math crate.

/// Error type for all fallible operations in the saga-math crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    /// Returned when matrix or vector shapes do not agree.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected size.
        expected: usize,
        /// Size actually provided.
        got: usize,
    },

    /// Returned when a matrix that must be square is not.
    #[error("matrix is not square ({rows}x{cols})")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Returned when a Cholesky factorisation meets a non-positive pivot.
    #[error("matrix is not positive definite (pivot {index})")]
    NotPositiveDefinite {
        /// Row of the failing pivot.
        index: usize,
    },

    /// Returned when a linear system has no unique solution.
    #[error("singular linear system (pivot {index})")]
    Singular {
        /// Column of the vanishing pivot.
        index: usize,
    },

    /// Returned when a polynomial is built without coefficients.
    #[error("polynomial needs at least one coefficient")]
    EmptyPolynomial,
}
