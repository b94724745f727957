//! Immutable polynomials in the backshift operator `B`.
//!
//! A [`Polynomial`] stores `c[0] + c[1] B + ... + c[d] B^d`. AR and MA
//! operators keep `c[0] = 1`; every operation returns a new value.

use std::fmt;
use std::sync::Arc;

use crate::error::MathError;

/// Polynomial with real coefficients, constant term first.
#[derive(Clone, PartialEq)]
pub struct Polynomial {
    c: Arc<[f64]>,
}

impl Polynomial {
    /// Builds a polynomial from its coefficients (constant term first).
    ///
    /// # Errors
    ///
    /// [`MathError::EmptyPolynomial`] if `coefficients` is empty.
    pub fn new(coefficients: &[f64]) -> Result<Self, MathError> {
        if coefficients.is_empty() {
            return Err(MathError::EmptyPolynomial);
        }
        Ok(Self {
            c: Arc::from(coefficients),
        })
    }

    /// The constant polynomial `1`.
    pub fn one() -> Self {
        Self {
            c: Arc::from(&[1.0][..]),
        }
    }

    /// Builds `1 + a[0] B + a[1] B^2 + ...` from the coefficients of the
    /// positive powers.
    pub fn from_operator(a: &[f64]) -> Self {
        Self::from_lag(a, 1)
    }

    /// Builds `1 + a[0] B^lag + a[1] B^(2 lag) + ...`.
    ///
    /// Used for seasonal operators, where `lag` is the period.
    pub fn from_lag(a: &[f64], lag: usize) -> Self {
        let lag = lag.max(1);
        let mut c = vec![0.0; 1 + a.len() * lag];
        c[0] = 1.0;
        for (i, &ai) in a.iter().enumerate() {
            c[(i + 1) * lag] = ai;
        }
        Self { c: Arc::from(c) }
    }

    /// Degree of the polynomial (index of the last stored coefficient).
    pub fn degree(&self) -> usize {
        self.c.len() - 1
    }

    /// All coefficients, constant term first.
    pub fn coefficients(&self) -> &[f64] {
        &self.c
    }

    /// Coefficient of `B^i`, zero beyond the degree.
    pub fn coefficient(&self, i: usize) -> f64 {
        self.c.get(i).copied().unwrap_or(0.0)
    }

    /// Returns `true` for the constant polynomial `1`.
    pub fn is_identity(&self) -> bool {
        self.c[0] == 1.0 && self.c[1..].iter().all(|&x| x == 0.0)
    }

    /// Evaluates the polynomial at `x` (Horner scheme).
    pub fn evaluate(&self, x: f64) -> f64 {
        self.c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
    }

    /// Product of two polynomials.
    pub fn times(&self, other: &Polynomial) -> Polynomial {
        let mut c = vec![0.0; self.c.len() + other.c.len() - 1];
        for (i, &a) in self.c.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            for (j, &b) in other.c.iter().enumerate() {
                c[i + j] += a * b;
            }
        }
        Polynomial { c: Arc::from(c) }
    }

    /// Sum of two polynomials.
    pub fn plus(&self, other: &Polynomial) -> Polynomial {
        self.combine(other, 1.0)
    }

    /// Difference of two polynomials.
    pub fn minus(&self, other: &Polynomial) -> Polynomial {
        self.combine(other, -1.0)
    }

    /// Multiplies every coefficient by `k`.
    pub fn scaled(&self, k: f64) -> Polynomial {
        let c: Vec<f64> = self.c.iter().map(|&x| x * k).collect();
        Polynomial { c: Arc::from(c) }
    }

    /// `self^n`; `self^0` is the constant `1`.
    pub fn pow(&self, n: usize) -> Polynomial {
        (0..n).fold(Polynomial::one(), |acc, _| acc.times(self))
    }

    /// Drops trailing coefficients whose magnitude is at most `eps`.
    ///
    /// The constant term is always kept.
    pub fn trimmed(&self, eps: f64) -> Polynomial {
        let mut d = self.degree();
        while d > 0 && self.c[d].abs() <= eps {
            d -= 1;
        }
        Polynomial {
            c: Arc::from(&self.c[..=d]),
        }
    }

    fn combine(&self, other: &Polynomial, sign: f64) -> Polynomial {
        let n = self.c.len().max(other.c.len());
        let c: Vec<f64> = (0..n)
            .map(|i| self.coefficient(i) + sign * other.coefficient(i))
            .collect();
        Polynomial { c: Arc::from(c) }
    }
}

impl fmt::Debug for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Polynomial").field(&&self.c[..]).finish()
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.c[0])?;
        for (i, &ci) in self.c.iter().enumerate().skip(1) {
            if ci == 0.0 {
                continue;
            }
            let sign = if ci < 0.0 { '-' } else { '+' };
            match i {
                1 => write!(f, " {sign} {}B", ci.abs())?,
                _ => write!(f, " {sign} {}B^{i}", ci.abs())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_is_rejected() {
        assert_eq!(Polynomial::new(&[]), Err(MathError::EmptyPolynomial));
    }

    #[test]
    fn from_lag_places_coefficients() {
        let p = Polynomial::from_lag(&[-0.6, 0.2], 4);
        assert_eq!(p.degree(), 8);
        assert_eq!(p.coefficient(0), 1.0);
        assert_eq!(p.coefficient(4), -0.6);
        assert_eq!(p.coefficient(8), 0.2);
        assert_eq!(p.coefficient(5), 0.0);
        assert_eq!(p.coefficient(42), 0.0);
    }

    #[test]
    fn times_matches_hand_expansion() {
        // (1 - 0.5B)(1 + 0.3B) = 1 - 0.2B - 0.15B^2
        let a = Polynomial::from_operator(&[-0.5]);
        let b = Polynomial::from_operator(&[0.3]);
        let c = a.times(&b);
        assert_eq!(c.degree(), 2);
        assert_abs_diff_eq!(c.coefficient(1), -0.2, epsilon = 1e-15);
        assert_abs_diff_eq!(c.coefficient(2), -0.15, epsilon = 1e-15);
    }

    #[test]
    fn differencing_operator() {
        let d = Polynomial::from_operator(&[-1.0]).pow(2);
        assert_eq!(d.coefficients(), &[1.0, -2.0, 1.0]);
        assert!(Polynomial::from_operator(&[-1.0]).pow(0).is_identity());
    }

    #[test]
    fn plus_minus_scaled() {
        let a = Polynomial::new(&[1.0, 2.0]).unwrap();
        let b = Polynomial::new(&[0.5, 0.0, 3.0]).unwrap();
        assert_eq!(a.plus(&b).coefficients(), &[1.5, 2.0, 3.0]);
        assert_eq!(a.minus(&b).coefficients(), &[0.5, 2.0, -3.0]);
        assert_eq!(a.scaled(2.0).coefficients(), &[2.0, 4.0]);
    }

    #[test]
    fn evaluate_horner() {
        let p = Polynomial::new(&[1.0, -0.5, 0.25]).unwrap();
        assert_abs_diff_eq!(p.evaluate(2.0), 1.0 - 1.0 + 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(p.evaluate(1.0), 0.75, epsilon = 1e-15);
    }

    #[test]
    fn trimmed_drops_small_tail_only() {
        let p = Polynomial::new(&[1.0, 0.0, 0.4, 1e-14, 0.0]).unwrap();
        let t = p.trimmed(1e-9);
        assert_eq!(t.coefficients(), &[1.0, 0.0, 0.4]);
        let one = Polynomial::new(&[1.0, 1e-20]).unwrap().trimmed(1e-9);
        assert!(one.is_identity());
        assert_eq!(one.degree(), 0);
    }

    #[test]
    fn display_format() {
        let p = Polynomial::from_operator(&[-0.5, 0.25]);
        assert_eq!(p.to_string(), "1 - 0.5B + 0.25B^2");
    }
}
