//! Assembled state-space model.

use crate::contract::{Dynamics, Initialization, Measurements};
use crate::error::SsfError;
use crate::smoother::{KalmanSmoother, SmoothedStates};

/// A [`Dynamics`] / [`Measurements`] / [`Initialization`] triplet sharing
/// one state vector.
#[derive(Clone, Debug)]
pub struct Ssf<D, M, I> {
    /// State transition.
    pub dynamics: D,
    /// Observation equations.
    pub measurements: M,
    /// Initial state distribution.
    pub initialization: I,
}

impl<D: Dynamics, M: Measurements, I: Initialization> Ssf<D, M, I> {
    /// Assembles a model after checking that the parts agree on the state dimension.
    pub fn new(dynamics: D, measurements: M, initialization: I) -> Result<Self, SsfError> {
        if initialization.dim() != dynamics.dim() {
            return Err(SsfError::DimensionMismatch {
                what: "initial state",
                expected: dynamics.dim(),
                got: initialization.dim(),
            });
        }
        Ok(Self {
            dynamics,
            measurements,
            initialization,
        })
    }

    /// State dimension.
    pub fn dim(&self) -> usize {
        self.dynamics.dim()
    }

    /// Smoothed states of `data` (`n x measurements.count()`, NaN = missing)
    /// with the default [`KalmanSmoother`].
    pub fn smooth(&self, data: ndarray::ArrayView2<f64>) -> Result<SmoothedStates, SsfError> {
        KalmanSmoother::default().smooth(self, data)
    }
}
