//! # saga-arima
//!
//! Stationary ARMA and seasonal ARIMA models with an exact Gaussian
//! likelihood evaluator (Kalman filter on the companion state space).
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     A["SarimaSpec::airline(12)"] -->|"SarimaModel::new(..)?"| B["SarimaModel"]
//!     B -->|"to_arma()?"| C["ArmaModel"]
//!     C -->|"ArmaKf::new(&model)?"| D["ArmaKf"]
//!     D -->|".process(&y)?"| E["Likelihood"]
//!     D -->|".fast_processing(&y, k)?"| F["BIC"]
//! ```
//!
//! ## Sign Convention
//!
//! `Φ(B) y_t = Θ(B) ε_t` with `Φ(B) = 1 + φ1 B + ... + φp B^p` and
//! `Θ(B) = 1 + θ1 B + ... + θq B^q`. The AR(1) process
//! `y_t = 0.5 y_{t-1} + ε_t` therefore has `φ1 = -0.5`.
//!
//! ## Glossary
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | ssq | [`Likelihood::ssq()`] | sum of squared standardized prediction errors |
//! | logdet | [`Likelihood::log_determinant()`] | `Σ ln h_t` |
//! | h | | one-step prediction error variance (in units of the model) |
//! | σ² | [`LinearModel::innovation_variance()`] | variance of `ε_t` |

mod autocovariance;
mod error;
mod kalman;
mod likelihood;
mod model;
mod spec;
mod state_space;

pub mod params;

pub use autocovariance::{autocovariances, psi_weights};
pub use error::ArimaError;
pub use kalman::{ArmaKf, EvaluationCounter};
pub use likelihood::Likelihood;
pub use model::{ArmaModel, LinearModel, SarimaModel};
pub use spec::SarimaSpec;
pub use state_space::ArmaStateSpace;
