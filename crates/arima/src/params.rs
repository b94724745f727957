//! Partial-autocorrelation parametrisation of AR operators.
//!
//! For `Φ(B) = 1 + φ1 B + ... + φp B^p` the Levinson-Durbin recursion maps
//! partial autocorrelations `r_1..r_p` to `φ`, and the step-down recursion
//! maps `φ` back. The operator is stationary iff every `|r_k| < 1`
//! (Jones 1980, Monahan 1984).

/// Maps partial autocorrelations to operator coefficients `φ1..φp`.
pub fn pacf_to_ar(r: &[f64]) -> Vec<f64> {
    let p = r.len();
    if p == 0 {
        return Vec::new();
    }

    // Levinson-Durbin on the regression form y_t = a_1 y_{t-1} + ...
    let mut a = vec![0.0; p];
    let mut prev = vec![0.0; p];
    a[0] = r[0];
    for k in 1..p {
        prev[..k].copy_from_slice(&a[..k]);
        a[k] = r[k];
        for j in 0..k {
            a[j] = prev[j] - r[k] * prev[k - 1 - j];
        }
    }

    // Φ(B) = 1 - a_1 B - ... - a_p B^p
    a.iter().map(|x| -x).collect()
}

/// Maps operator coefficients `φ1..φp` to partial autocorrelations.
///
/// Returns `None` as soon as a partial autocorrelation reaches the unit
/// circle, since the step-down recursion is undefined from there on.
pub fn ar_to_pacf(phi: &[f64]) -> Option<Vec<f64>> {
    let p = phi.len();
    let mut a: Vec<f64> = phi.iter().map(|x| -x).collect();
    let mut r = vec![0.0; p];
    for k in (0..p).rev() {
        let rk = a[k];
        if !rk.is_finite() || rk.abs() >= 1.0 {
            return None;
        }
        r[k] = rk;
        let denom = 1.0 - rk * rk;
        let prev: Vec<f64> = (0..k).map(|j| (a[j] + rk * a[k - 1 - j]) / denom).collect();
        a[..k].copy_from_slice(&prev);
    }
    Some(r)
}

/// Returns `true` when all roots of `1 + φ1 B + ... + φp B^p` lie outside
/// the unit circle.
pub fn is_stable(phi: &[f64]) -> bool {
    ar_to_pacf(phi).is_some()
}

/// Maps unconstrained reals to stationary operator coefficients through
/// `r_k = tanh(alpha_k)`.
pub fn unconstrained_to_ar(alpha: &[f64]) -> Vec<f64> {
    let r: Vec<f64> = alpha.iter().map(|a| a.tanh()).collect();
    pacf_to_ar(&r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_input() {
        assert!(pacf_to_ar(&[]).is_empty());
        assert_eq!(ar_to_pacf(&[]), Some(vec![]));
        assert!(is_stable(&[]));
    }

    #[test]
    fn single_coefficient_sign() {
        // r = 0.5 means y_t = 0.5 y_{t-1} + e_t, i.e. Φ(B) = 1 - 0.5B
        assert_eq!(pacf_to_ar(&[0.5]), vec![-0.5]);
    }

    #[test]
    fn two_coefficients() {
        let r = [0.5_f64.tanh(), 0.3_f64.tanh()];
        let phi = pacf_to_ar(&r);
        let a0 = r[0] - r[1] * r[0];
        assert_abs_diff_eq!(phi[0], -a0, epsilon = 1e-14);
        assert_abs_diff_eq!(phi[1], -r[1], epsilon = 1e-14);
    }

    #[test]
    fn step_down_inverts_levinson() {
        let cases: &[&[f64]] = &[&[0.3], &[0.9, -0.4], &[-0.2, 0.5, 0.7], &[0.1, 0.1, 0.1, -0.95]];
        for r in cases {
            let phi = pacf_to_ar(r);
            let back = ar_to_pacf(&phi).unwrap();
            for (x, y) in back.iter().zip(r.iter()) {
                assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn ar1_boundary() {
        assert!(is_stable(&[-0.99]));
        assert!(!is_stable(&[-1.0]));
        assert!(!is_stable(&[-1.5]));
        assert!(!is_stable(&[1.5]));
    }

    #[test]
    fn ar2_triangle() {
        // y_t = a1 y_{t-1} + a2 y_{t-2}: stationary iff |a2| < 1, a1 + a2 < 1, a2 - a1 < 1
        let stable = |a1: f64, a2: f64| is_stable(&[-a1, -a2]);
        assert!(stable(0.5, 0.3));
        assert!(stable(-1.2, -0.5));
        assert!(!stable(0.7, 0.4));
        assert!(!stable(0.2, -1.1));
        assert!(!stable(-0.8, 0.3));
    }

    #[test]
    fn unit_root_polynomial_is_unstable() {
        // (1 - B)(1 - 0.5B) = 1 - 1.5B + 0.5B^2
        assert!(!is_stable(&[-1.5, 0.5]));
    }

    #[test]
    fn unconstrained_always_stable() {
        let cases: &[&[f64]] = &[&[1.0, -2.0, 3.0], &[10.0], &[-3.0, 2.0], &[0.1, 0.2]];
        for alpha in cases {
            assert!(is_stable(&unconstrained_to_ar(alpha)), "alpha = {:?}", alpha);
        }
    }

    #[test]
    fn negation_symmetry() {
        for a in [0.0, 0.5, 1.0, 2.0] {
            let pos = unconstrained_to_ar(&[a]);
            let neg = unconstrained_to_ar(&[-a]);
            assert_abs_diff_eq!(pos[0] + neg[0], 0.0, epsilon = 1e-15);
        }
    }
}
