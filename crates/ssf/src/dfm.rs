//! Dynamic factor models.

use crate::error::SsfError;
use crate::initialization::{CovarianceCache, SteadyStateInitialization};
use crate::measurement::{DfmMeasurements, MeasurementDescriptor};
use crate::model::Ssf;
use crate::var::{VarDescriptor, VarDynamics};

/// Dynamic factor model: VAR factors, pattern loadings, stationary start.
pub type SsfDfm = Ssf<VarDynamics, DfmMeasurements, SteadyStateInitialization>;

impl SsfDfm {
    /// Builds a factor model with `nlx` lags per factor.
    ///
    /// # Example
    ///
    /// ```
    /// use ndarray::array;
    /// use saga_ssf::{MeasurementDescriptor, MeasurementKind, SsfDfm, VarDescriptor};
    ///
    /// let var = VarDescriptor::independent_ar1(&[0.8], &[1.0]).unwrap();
    /// let level = MeasurementDescriptor::new(MeasurementKind::Level, vec![1.0], 0.1);
    /// let quarterly = MeasurementDescriptor::new(MeasurementKind::Average { length: 3 }, vec![1.0], 0.0);
    /// let dfm = SsfDfm::from_descriptors(var, 3, vec![level, quarterly]).unwrap();
    ///
    /// let data = array![[1.0, f64::NAN], [1.2, f64::NAN], [0.9, 1.0], [0.7, f64::NAN]];
    /// let smoothed = dfm.smooth(data.view()).unwrap();
    /// assert_eq!(smoothed.states().dim(), (4, 3));
    /// ```
    pub fn from_descriptors(
        var: VarDescriptor,
        nlx: usize,
        measurements: Vec<MeasurementDescriptor>,
    ) -> Result<Self, SsfError> {
        let nf = var.nf();
        let dynamics = VarDynamics::new(var, nlx)?;
        let initialization = SteadyStateInitialization::new(&dynamics)?;
        let measurements = DfmMeasurements::new(nf, nlx, measurements)?;
        Ssf::new(dynamics, measurements, initialization)
    }

    /// Same as [`from_descriptors`](Self::from_descriptors), with the
    /// initial covariance looked up in `cache`.
    pub fn from_descriptors_cached(
        var: VarDescriptor,
        nlx: usize,
        measurements: Vec<MeasurementDescriptor>,
        cache: &CovarianceCache,
    ) -> Result<Self, SsfError> {
        let nf = var.nf();
        let dynamics = VarDynamics::new(var, nlx)?;
        let initialization = SteadyStateInitialization::cached(&dynamics, cache)?;
        let measurements = DfmMeasurements::new(nf, nlx, measurements)?;
        Ssf::new(dynamics, measurements, initialization)
    }
}
