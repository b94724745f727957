//! # saga-benchmarking
//!
//! Benchmarking of time series: high-frequency indicators are adjusted so
//! that they agree with low-frequency benchmarks (temporal constraints) and
//! with accounting identities between series (contemporaneous
//! constraints), while keeping their short-term movements.
//!
//! Adjustments follow the Cholette model: the benchmarked series is
//! `x + |x|^lambda u` where `u` is an AR(1) process, and `u` is estimated
//! by Kalman smoothing of exact constraint equations.
//!
//! ## Pipeline
//!
//! ```mermaid
//! graph LR
//!     A["series + constraints"] -->|"load_info"| B["validated constraints"]
//!     B -->|"temporal only"| C["cholette::benchmark"]
//!     B -->|"build_domain / build_weights / build_constraints"| D["CholetteSystem"]
//!     C -->|"benchmarked totals"| D
//!     D -->|"KalmanSmoother"| E["x + w u"]
//! ```
//!
//! ## Glossary
//!
//! | Term | Meaning |
//! |------|---------|
//! | detail | high-frequency series being benchmarked |
//! | aggregate | low-frequency benchmark of a detail series |
//! | total | left-hand side of a contemporaneous constraint |
//! | component | series on the right-hand side of a contemporaneous constraint |

pub mod cholette;
mod constraint;
mod error;
mod multivariate;
mod series;
mod spec;
mod ssf_cholette;

pub use constraint::{Aggregation, ContemporaneousConstraint, TemporalConstraint, Total};
pub use error::BenchmarkError;
pub use multivariate::MultivariateCholetteProcessor;
pub use series::{TsData, TsDomain, TsFrequency, TsPeriod};
pub use spec::{BiasCorrection, CholetteSpec};
pub use ssf_cholette::{CholetteLoading, CholetteMeasurements, Term};
