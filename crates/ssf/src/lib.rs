//! # saga-ssf
//!
//! Linear Gaussian state-space models expressed through matrix-free
//! operators, with the building blocks of dynamic factor models and
//! benchmarking systems.
//!
//! ## Building Blocks
//!
//! ```mermaid
//! graph LR
//!     A["VarDescriptor"] -->|"VarDynamics::new(desc, nlx)?"| B["Dynamics"]
//!     B -->|"SteadyStateInitialization::new(&dyn)?"| C["Initialization"]
//!     D["MeasurementDescriptor"] -->|"DfmMeasurements::new(..)?"| E["Measurements"]
//!     B --> F["Ssf"]
//!     C --> F
//!     E --> F
//!     F -->|".smooth(data)?"| G["SmoothedStates"]
//! ```
//!
//! ## State Layout
//!
//! A VAR on `nf` factors keeps `nlx` lags of each factor; slot
//! `g * nlx + l` is factor `g` at lag `l`.

mod contract;
mod dfm;
mod error;
mod initialization;
mod measurement;
mod model;
mod smoother;
mod var;

pub use contract::{Dynamics, Initialization, Loading, Measurements};
pub use dfm::SsfDfm;
pub use error::SsfError;
pub use initialization::{
    CacheStats, CovarianceCache, DEFAULT_CACHE_CAPACITY, SteadyStateInitialization, solve_lyapunov,
    steady_state_covariance,
};
pub use measurement::{DfmLoading, DfmMeasurements, MeasurementDescriptor, MeasurementKind};
pub use model::Ssf;
pub use smoother::{FilterSummary, KalmanSmoother, SmoothedStates, SmootherConfig};
pub use var::{VarDescriptor, VarDynamics};
