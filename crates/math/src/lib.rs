//! # saga-math
//!
//! Leaf primitives shared by the saga crates: immutable backshift
//! polynomials for AR/MA operators and dense linear algebra on `ndarray`
//! matrices (Cholesky, triangular solves, pivoted Gaussian elimination).
//!
//! ```
//! use saga_math::Polynomial;
//!
//! let ar = Polynomial::from_operator(&[-0.5]);
//! let sar = Polynomial::from_lag(&[-0.3], 12);
//! assert_eq!(ar.times(&sar).degree(), 13);
//! ```

mod error;
pub mod linalg;
mod polynomial;

pub use error::MathError;
pub use polynomial::Polynomial;
