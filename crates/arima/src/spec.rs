//! SARIMA orders (unestimated model structure).

use crate::error::ArimaError;

/// Orders of a SARIMA `(p, d, q)(bp, bd, bq)_period` model.
///
/// # Example
///
/// ```
/// use saga_arima::SarimaSpec;
///
/// let airline = SarimaSpec::airline(12);
/// assert_eq!(airline.period(), 12);
/// assert_eq!(airline.q(), 1);
/// assert_eq!(airline.bq(), 1);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SarimaSpec {
    period: usize,
    p: usize,
    d: usize,
    q: usize,
    bp: usize,
    bd: usize,
    bq: usize,
}

impl SarimaSpec {
    /// Creates a non-seasonal ARIMA(p, d, q) specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            period: 1,
            p,
            d,
            q,
            bp: 0,
            bd: 0,
            bq: 0,
        }
    }

    /// Creates the airline model `(0,1,1)(0,1,1)_period`.
    pub fn airline(period: usize) -> Self {
        Self::new(0, 1, 1).with_seasonal(period, 0, 1, 1)
    }

    /// Sets the seasonal period and orders.
    pub fn with_seasonal(mut self, period: usize, bp: usize, bd: usize, bq: usize) -> Self {
        self.period = period;
        self.bp = bp;
        self.bd = bd;
        self.bq = bq;
        self
    }

    /// Seasonal period (1 for non-seasonal models).
    pub fn period(&self) -> usize {
        self.period
    }

    /// Regular AR order.
    pub fn p(&self) -> usize {
        self.p
    }

    /// Regular differencing order.
    pub fn d(&self) -> usize {
        self.d
    }

    /// Regular MA order.
    pub fn q(&self) -> usize {
        self.q
    }

    /// Seasonal AR order.
    pub fn bp(&self) -> usize {
        self.bp
    }

    /// Seasonal differencing order.
    pub fn bd(&self) -> usize {
        self.bd
    }

    /// Seasonal MA order.
    pub fn bq(&self) -> usize {
        self.bq
    }

    /// Number of free ARMA coefficients `p + q + bp + bq`.
    pub fn parameters_count(&self) -> usize {
        self.p + self.q + self.bp + self.bq
    }

    /// Returns `true` when no differencing is applied.
    pub fn is_stationary_structure(&self) -> bool {
        self.d == 0 && self.bd == 0
    }

    /// Validates the specification.
    ///
    /// The period must be at least 1, and a non-seasonal period cannot
    /// carry seasonal orders.
    pub fn validate(&self) -> Result<(), ArimaError> {
        if self.period == 0 {
            return Err(ArimaError::InvalidModel {
                reason: "period must be at least 1".to_string(),
            });
        }
        if self.period == 1 && (self.bp > 0 || self.bd > 0 || self.bq > 0) {
            return Err(ArimaError::InvalidModel {
                reason: "seasonal orders require a period greater than 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_round_trip() {
        let spec = SarimaSpec::new(2, 1, 1).with_seasonal(4, 1, 0, 1);
        assert_eq!(spec.p(), 2);
        assert_eq!(spec.d(), 1);
        assert_eq!(spec.q(), 1);
        assert_eq!(spec.period(), 4);
        assert_eq!(spec.bp(), 1);
        assert_eq!(spec.bd(), 0);
        assert_eq!(spec.bq(), 1);
        assert_eq!(spec.parameters_count(), 5);
        assert!(!spec.is_stationary_structure());
    }

    #[test]
    fn spec_is_copy() {
        let a = SarimaSpec::airline(12);
        let b = a;
        assert_eq!(a, b);
    }

    #[test]
    fn validate_period() {
        assert!(SarimaSpec::new(1, 0, 1).validate().is_ok());
        assert!(SarimaSpec::airline(12).validate().is_ok());
        let zero = SarimaSpec::new(1, 0, 0).with_seasonal(0, 0, 0, 0);
        assert!(matches!(zero.validate(), Err(ArimaError::InvalidModel { .. })));
        let bad = SarimaSpec::new(0, 0, 0).with_seasonal(1, 1, 0, 0);
        assert!(matches!(bad.validate(), Err(ArimaError::InvalidModel { .. })));
    }
}
