//! Immutable ARMA and SARIMA models.
//!
//! Operators follow the convention `Φ(B) y_t = Θ(B) ε_t` with
//! `Φ(B) = 1 + φ1 B + ... + φp B^p` and `Θ(B) = 1 + θ1 B + ... + θq B^q`.
//! Models are validated on construction and never mutated afterwards.

use saga_math::Polynomial;

use crate::autocovariance;
use crate::error::ArimaError;
use crate::params;
use crate::spec::SarimaSpec;

/// Common view of a linear (ARMA-type) model used by the filters.
pub trait LinearModel {
    /// Stationary autoregressive operator.
    fn ar(&self) -> Polynomial;

    /// Moving-average operator.
    fn ma(&self) -> Polynomial;

    /// Variance of the innovations `ε_t`.
    fn innovation_variance(&self) -> f64;

    /// Returns `true` when the process is stationary.
    fn is_stationary(&self) -> bool;
}

fn check_operator(p: &Polynomial, operator: &'static str) -> Result<(), ArimaError> {
    let lead = p.coefficient(0);
    if lead != 1.0 {
        return Err(ArimaError::NonUnitLeadingCoefficient {
            operator,
            value: lead,
        });
    }
    if p.coefficients().iter().any(|c| !c.is_finite()) {
        return Err(ArimaError::InvalidModel {
            reason: format!("{operator} polynomial has non-finite coefficients"),
        });
    }
    Ok(())
}

fn check_variance(var: f64) -> Result<(), ArimaError> {
    if !var.is_finite() || var <= 0.0 {
        return Err(ArimaError::InvalidModel {
            reason: format!("innovation variance must be finite and positive, got {var}"),
        });
    }
    Ok(())
}

/// ARMA(p, q) model.
#[derive(Clone, Debug, PartialEq)]
pub struct ArmaModel {
    ar: Polynomial,
    ma: Polynomial,
    var: f64,
}

impl ArmaModel {
    /// Builds a model from its operators.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArimaError::NonUnitLeadingCoefficient`] | `ar[0] != 1` or `ma[0] != 1` |
    /// | [`ArimaError::InvalidModel`] | non-finite coefficients or `var <= 0` |
    pub fn new(ar: Polynomial, ma: Polynomial, var: f64) -> Result<Self, ArimaError> {
        check_operator(&ar, "AR")?;
        check_operator(&ma, "MA")?;
        check_variance(var)?;
        Ok(Self { ar, ma, var })
    }

    /// Builds a model from `φ1..φp` and `θ1..θq`.
    ///
    /// ```
    /// use saga_arima::{ArmaModel, LinearModel};
    ///
    /// let m = ArmaModel::from_coefficients(&[-0.5], &[0.3], 1.0).unwrap();
    /// assert!(m.is_stationary());
    /// assert_eq!(m.ar().degree(), 1);
    /// ```
    pub fn from_coefficients(phi: &[f64], theta: &[f64], var: f64) -> Result<Self, ArimaError> {
        Self::new(
            Polynomial::from_operator(phi),
            Polynomial::from_operator(theta),
            var,
        )
    }

    /// Gaussian white noise with variance `var`.
    pub fn white_noise(var: f64) -> Result<Self, ArimaError> {
        Self::new(Polynomial::one(), Polynomial::one(), var)
    }

    /// AR order `p`.
    pub fn p(&self) -> usize {
        self.ar.degree()
    }

    /// MA order `q`.
    pub fn q(&self) -> usize {
        self.ma.degree()
    }

    /// Returns `true` when all MA roots lie outside the unit circle.
    pub fn is_invertible(&self) -> bool {
        params::is_stable(&self.ma.coefficients()[1..])
    }

    /// First `n` weights of the MA(∞) representation.
    pub fn psi_weights(&self, n: usize) -> Vec<f64> {
        autocovariance::psi_weights(&self.ar, &self.ma, n)
    }

    /// Autocovariances `γ_0..γ_{n-1}`.
    ///
    /// # Errors
    ///
    /// [`ArimaError::NonStationaryModel`] if the model is not stationary.
    pub fn autocovariances(&self, n: usize) -> Result<Vec<f64>, ArimaError> {
        if !self.is_stationary() {
            return Err(ArimaError::NonStationaryModel);
        }
        autocovariance::autocovariances(&self.ar, &self.ma, self.var, n)
    }

    /// Returns a copy with another innovation variance.
    pub fn with_variance(&self, var: f64) -> Result<Self, ArimaError> {
        Self::new(self.ar.clone(), self.ma.clone(), var)
    }
}

impl LinearModel for ArmaModel {
    fn ar(&self) -> Polynomial {
        self.ar.clone()
    }

    fn ma(&self) -> Polynomial {
        self.ma.clone()
    }

    fn innovation_variance(&self) -> f64 {
        self.var
    }

    fn is_stationary(&self) -> bool {
        params::is_stable(&self.ar.coefficients()[1..])
    }
}

/// Seasonal ARIMA model `Φ(B)BΦ(B^s)(1-B)^d(1-B^s)^D y_t = Θ(B)BΘ(B^s) ε_t`.
#[derive(Clone, Debug, PartialEq)]
pub struct SarimaModel {
    spec: SarimaSpec,
    phi: Vec<f64>,
    theta: Vec<f64>,
    bphi: Vec<f64>,
    btheta: Vec<f64>,
    var: f64,
}

fn check_count(operator: &'static str, expected: usize, got: &[f64]) -> Result<(), ArimaError> {
    if expected != got.len() {
        return Err(ArimaError::CoefficientCount {
            operator,
            expected,
            got: got.len(),
        });
    }
    if got.iter().any(|c| !c.is_finite()) {
        return Err(ArimaError::InvalidModel {
            reason: format!("{operator} coefficients must be finite"),
        });
    }
    Ok(())
}

impl SarimaModel {
    /// Builds a fully validated SARIMA model.
    ///
    /// Coefficient slices hold the positive powers only
    /// (`phi = [φ1, .., φp]`), and their lengths must match `spec`.
    pub fn new(
        spec: SarimaSpec,
        phi: &[f64],
        theta: &[f64],
        bphi: &[f64],
        btheta: &[f64],
        var: f64,
    ) -> Result<Self, ArimaError> {
        spec.validate()?;
        check_count("AR", spec.p(), phi)?;
        check_count("MA", spec.q(), theta)?;
        check_count("seasonal AR", spec.bp(), bphi)?;
        check_count("seasonal MA", spec.bq(), btheta)?;
        check_variance(var)?;
        Ok(Self {
            spec,
            phi: phi.to_vec(),
            theta: theta.to_vec(),
            bphi: bphi.to_vec(),
            btheta: btheta.to_vec(),
            var,
        })
    }

    /// Airline model `(0,1,1)(0,1,1)_period`.
    pub fn airline(period: usize, theta: f64, btheta: f64) -> Result<Self, ArimaError> {
        Self::new(SarimaSpec::airline(period), &[], &[theta], &[], &[btheta], 1.0)
    }

    /// Model orders.
    pub fn spec(&self) -> SarimaSpec {
        self.spec
    }

    /// Regular AR coefficients `φ1..φp`.
    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    /// Regular MA coefficients `θ1..θq`.
    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    /// Seasonal AR coefficients.
    pub fn bphi(&self) -> &[f64] {
        &self.bphi
    }

    /// Seasonal MA coefficients.
    pub fn btheta(&self) -> &[f64] {
        &self.btheta
    }

    /// Regular AR operator `Φ(B)`.
    pub fn regular_ar(&self) -> Polynomial {
        Polynomial::from_operator(&self.phi)
    }

    /// Seasonal AR operator `BΦ(B^s)`.
    pub fn seasonal_ar(&self) -> Polynomial {
        Polynomial::from_lag(&self.bphi, self.spec.period())
    }

    /// Differencing operator `(1-B)^d (1-B^s)^D`.
    pub fn differencing(&self) -> Polynomial {
        let regular = Polynomial::from_operator(&[-1.0]).pow(self.spec.d());
        let seasonal = Polynomial::from_lag(&[-1.0], self.spec.period()).pow(self.spec.bd());
        regular.times(&seasonal)
    }

    /// Full autoregressive operator including differencing.
    pub fn non_stationary_ar(&self) -> Polynomial {
        self.ar().times(&self.differencing())
    }

    /// Stationary ARMA part, differencing discarded.
    pub fn to_arma(&self) -> Result<ArmaModel, ArimaError> {
        ArmaModel::new(self.ar(), self.ma(), self.var)
    }

    /// Returns a copy in which trailing coefficients with magnitude at most
    /// `eps` are dropped from each operator and the orders reduced
    /// accordingly.
    pub fn adjusted(&self, eps: f64) -> SarimaModel {
        fn trim(c: &[f64], eps: f64) -> Vec<f64> {
            let mut n = c.len();
            while n > 0 && c[n - 1].abs() <= eps {
                n -= 1;
            }
            c[..n].to_vec()
        }
        let phi = trim(&self.phi, eps);
        let theta = trim(&self.theta, eps);
        let bphi = trim(&self.bphi, eps);
        let btheta = trim(&self.btheta, eps);
        let spec = SarimaSpec::new(phi.len(), self.spec.d(), theta.len()).with_seasonal(
            self.spec.period(),
            bphi.len(),
            self.spec.bd(),
            btheta.len(),
        );
        SarimaModel {
            spec,
            phi,
            theta,
            bphi,
            btheta,
            var: self.var,
        }
    }
}

impl LinearModel for SarimaModel {
    fn ar(&self) -> Polynomial {
        self.regular_ar().times(&self.seasonal_ar())
    }

    fn ma(&self) -> Polynomial {
        Polynomial::from_operator(&self.theta)
            .times(&Polynomial::from_lag(&self.btheta, self.spec.period()))
    }

    fn innovation_variance(&self) -> f64 {
        self.var
    }

    fn is_stationary(&self) -> bool {
        self.spec.is_stationary_structure()
            && params::is_stable(&self.phi)
            && params::is_stable(&self.bphi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn arma_rejects_non_unit_leading() {
        let ar = Polynomial::new(&[2.0, 0.5]).unwrap();
        let err = ArmaModel::new(ar, Polynomial::one(), 1.0).unwrap_err();
        assert!(matches!(
            err,
            ArimaError::NonUnitLeadingCoefficient { operator: "AR", .. }
        ));
    }

    #[test]
    fn arma_rejects_bad_variance() {
        assert!(ArmaModel::white_noise(0.0).is_err());
        assert!(ArmaModel::white_noise(f64::NAN).is_err());
        assert!(ArmaModel::from_coefficients(&[f64::INFINITY], &[], 1.0).is_err());
    }

    #[test]
    fn arma_stationarity_and_invertibility() {
        let m = ArmaModel::from_coefficients(&[-0.5], &[1.2], 1.0).unwrap();
        assert!(m.is_stationary());
        assert!(!m.is_invertible());
        let n = ArmaModel::from_coefficients(&[-1.5], &[], 1.0).unwrap();
        assert!(!n.is_stationary());
        assert_eq!(n.autocovariances(2), Err(ArimaError::NonStationaryModel));
    }

    #[test]
    fn arma_orders() {
        let m = ArmaModel::from_coefficients(&[0.1, 0.2], &[0.3], 2.0).unwrap();
        assert_eq!(m.p(), 2);
        assert_eq!(m.q(), 1);
        assert_eq!(m.innovation_variance(), 2.0);
        let w = m.with_variance(3.0).unwrap();
        assert_eq!(w.innovation_variance(), 3.0);
        assert_eq!(w.ar(), m.ar());
    }

    #[test]
    fn sarima_operators() {
        let m = SarimaModel::new(
            SarimaSpec::new(1, 1, 1).with_seasonal(4, 1, 1, 1),
            &[-0.3],
            &[0.2],
            &[-0.5],
            &[0.4],
            1.0,
        )
        .unwrap();
        let ar = m.ar();
        assert_eq!(ar.degree(), 5);
        assert_abs_diff_eq!(ar.coefficient(1), -0.3, epsilon = 1e-15);
        assert_abs_diff_eq!(ar.coefficient(4), -0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(ar.coefficient(5), 0.15, epsilon = 1e-15);
        assert_eq!(m.ma().degree(), 5);
        assert_eq!(m.differencing().degree(), 5);
        assert_eq!(m.non_stationary_ar().degree(), 10);
        assert!(!m.is_stationary());
        assert!(m.to_arma().unwrap().is_stationary());
    }

    #[test]
    fn sarima_count_mismatch() {
        let err = SarimaModel::new(SarimaSpec::airline(12), &[], &[0.5], &[], &[], 1.0)
            .unwrap_err();
        assert_eq!(
            err,
            ArimaError::CoefficientCount {
                operator: "seasonal MA",
                expected: 1,
                got: 0
            }
        );
    }

    #[test]
    fn airline_differencing() {
        let m = SarimaModel::airline(12, -0.6, -0.4).unwrap();
        let d = m.differencing();
        assert_eq!(d.degree(), 13);
        assert_eq!(d.coefficient(0), 1.0);
        assert_eq!(d.coefficient(1), -1.0);
        assert_eq!(d.coefficient(12), -1.0);
        assert_eq!(d.coefficient(13), 1.0);
    }

    #[test]
    fn adjusted_trims_orders() {
        let m = SarimaModel::new(
            SarimaSpec::new(2, 0, 2).with_seasonal(12, 1, 0, 0),
            &[-0.5, 1e-12],
            &[0.3, 0.0],
            &[1e-15],
            &[],
            1.0,
        )
        .unwrap();
        let a = m.adjusted(1e-9);
        assert_eq!(a.spec().p(), 1);
        assert_eq!(a.spec().q(), 1);
        assert_eq!(a.spec().bp(), 0);
        assert_eq!(a.phi(), &[-0.5]);
        // the original is untouched
        assert_eq!(m.spec().p(), 2);
    }
}
