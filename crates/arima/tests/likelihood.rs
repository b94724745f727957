//! Integration tests for the ARMA Kalman likelihood.

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use saga_arima::{
    ArimaError, ArmaKf, ArmaModel, ArmaStateSpace, LinearModel, SarimaModel, SarimaSpec,
};

fn generate_arma(phi: &[f64], theta: &[f64], n: usize, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let burn = 200;
    let mut y = vec![0.0; n + burn];
    let mut e = vec![0.0; n + burn];
    for t in 0..n + burn {
        e[t] = normal.sample(&mut rng);
        let mut v = e[t];
        for (k, &p) in phi.iter().enumerate() {
            if t > k {
                v -= p * y[t - 1 - k];
            }
        }
        for (k, &q) in theta.iter().enumerate() {
            if t > k {
                v += q * e[t - 1 - k];
            }
        }
        y[t] = v;
    }
    y.split_off(burn)
}

/// Textbook Kalman filter with the full covariance recursion.
fn dense_filter(model: &ArmaModel, y: &[f64]) -> (f64, f64) {
    let ss = ArmaStateSpace::new(&model.ar(), &model.ma());
    let t = ss.t();
    let q = ss.rrt() * model.innovation_variance();
    let r = ss.dim();

    let mut p = Array2::<f64>::zeros((r, r));
    let mut term = q.clone();
    for _ in 0..2000 {
        p += &term;
        term = t.dot(&term).dot(&t.t());
    }

    let mut a = Array1::<f64>::zeros(r);
    let mut ssq = 0.0;
    let mut logdet = 0.0;
    for &obs in y {
        let f = p[[0, 0]];
        let e = obs - a[0];
        ssq += e * e / f;
        logdet += f.ln();
        let pz = p.column(0).to_owned();
        a = t.dot(&(&a + &(&pz * (e / f))));
        let mut pf = p.clone();
        for i in 0..r {
            for j in 0..r {
                pf[[i, j]] -= pz[i] * pz[j] / f;
            }
        }
        p = t.dot(&pf).dot(&t.t()) + &q;
    }
    (ssq, logdet)
}

#[test]
fn ar1_closed_form() {
    let model = ArmaModel::from_coefficients(&[-0.5], &[], 1.0).unwrap();
    let y = [1.0, 2.0, 1.5, 0.5, -1.0];
    let ll = ArmaKf::new(&model).unwrap().process(&y).unwrap();

    let mut ssq = y[0] * y[0] * 0.75;
    for t in 1..y.len() {
        let e: f64 = y[t] - 0.5 * y[t - 1];
        ssq += e * e;
    }
    let logdet = (4.0f64 / 3.0).ln();
    assert_abs_diff_eq!(ll.ssq(), ssq, epsilon = 1e-9);
    assert_abs_diff_eq!(ll.log_determinant(), logdet, epsilon = 1e-9);

    let n = 5.0;
    let expected = -0.5 * (n * (2.0 * std::f64::consts::PI).ln() + logdet + ssq);
    assert_abs_diff_eq!(ll.unconcentrated_log_likelihood(), expected, epsilon = 1e-9);
}

#[test]
fn white_noise_likelihood() {
    let model = ArmaModel::white_noise(1.0).unwrap();
    let y = generate_arma(&[], &[], 100, 3);
    let ll = ArmaKf::new(&model).unwrap().process(&y).unwrap();
    let ssq: f64 = y.iter().map(|v| v * v).sum();
    assert_abs_diff_eq!(ll.ssq(), ssq, epsilon = 1e-9);
    assert_abs_diff_eq!(ll.log_determinant(), 0.0, epsilon = 1e-12);
}

#[test]
fn matches_dense_filter() {
    let cases: &[(&[f64], &[f64])] = &[
        (&[-0.6], &[0.3]),
        (&[-0.5, 0.2], &[]),
        (&[], &[0.4, -0.2]),
        (&[0.3, -0.1, 0.2], &[0.5, 0.25]),
    ];
    for (i, (phi, theta)) in cases.iter().enumerate() {
        let model = ArmaModel::from_coefficients(phi, theta, 1.0).unwrap();
        let y = generate_arma(phi, theta, 60, 10 + i as u64);
        let ll = ArmaKf::new(&model).unwrap().process(&y).unwrap();
        let (ssq, logdet) = dense_filter(&model, &y);
        assert_abs_diff_eq!(ll.ssq(), ssq, epsilon = 1e-8);
        assert_abs_diff_eq!(ll.log_determinant(), logdet, epsilon = 1e-8);
    }
}

#[test]
fn scaled_variance_scales_ssq() {
    let y = generate_arma(&[-0.4], &[0.3], 80, 5);
    let m1 = ArmaModel::from_coefficients(&[-0.4], &[0.3], 1.0).unwrap();
    let m4 = m1.with_variance(4.0).unwrap();
    let l1 = ArmaKf::new(&m1).unwrap().process(&y).unwrap();
    let l4 = ArmaKf::new(&m4).unwrap().process(&y).unwrap();
    assert_abs_diff_eq!(l1.ssq(), 4.0 * l4.ssq(), epsilon = 1e-9);
    assert_abs_diff_eq!(l4.log_determinant() - l1.log_determinant(), 80.0 * 4f64.ln(), epsilon = 1e-8);
    assert_abs_diff_eq!(l1.log_likelihood(), l4.log_likelihood(), epsilon = 1e-8);
}

#[test]
fn deterministic() {
    let model = ArmaModel::from_coefficients(&[-0.7, 0.2], &[0.4], 1.0).unwrap();
    let y = generate_arma(&[-0.7, 0.2], &[0.4], 150, 7);
    let kf = ArmaKf::new(&model).unwrap();
    let a = kf.process(&y).unwrap();
    let b = kf.process(&y).unwrap();
    assert_eq!(a, b);
    assert_eq!(kf.fast_filter(&y).unwrap(), kf.fast_filter(&y).unwrap());
}

#[test]
fn fast_filter_matches_exact_tail() {
    let cases: &[(&[f64], &[f64])] = &[(&[-0.5, 0.3], &[]), (&[-0.6], &[0.5])];
    for (i, (phi, theta)) in cases.iter().enumerate() {
        let model = ArmaModel::from_coefficients(phi, theta, 1.0).unwrap();
        let y = generate_arma(phi, theta, 200, 20 + i as u64);
        let kf = ArmaKf::new(&model).unwrap();
        let exact = kf.process(&y).unwrap();
        let fast = kf.fast_filter(&y).unwrap();
        assert_eq!(fast.len(), y.len());
        for t in 100..y.len() {
            assert_abs_diff_eq!(fast[t], exact.residuals()[t], epsilon = 1e-9);
        }
        // The exact head is shared.
        assert_abs_diff_eq!(fast[0], exact.residuals()[0], epsilon = 1e-12);
    }
}

#[test]
fn fast_processing_is_bic_like() {
    let model = ArmaModel::from_coefficients(&[-0.5], &[], 1.0).unwrap();
    let y = generate_arma(&[-0.5], &[], 120, 9);
    let kf = ArmaKf::new(&model).unwrap();
    let residuals = kf.fast_filter(&y).unwrap();
    let n = y.len() as f64;
    let ssq: f64 = residuals.iter().map(|e| e * e).sum();
    let bic = kf.fast_processing(&y, 1).unwrap();
    assert_abs_diff_eq!(bic, (ssq / n).ln() + n.ln() / n, epsilon = 1e-12);
    assert!(kf.fast_processing(&y, 3).unwrap() > bic);
}

#[test]
fn non_stationary_rejected() {
    let model = ArmaModel::from_coefficients(&[-1.5], &[], 1.0).unwrap();
    assert_eq!(ArmaKf::new(&model).unwrap_err(), ArimaError::NonStationaryModel);

    let airline = SarimaModel::airline(12, -0.6, -0.4).unwrap();
    assert_eq!(ArmaKf::new(&airline).unwrap_err(), ArimaError::NonStationaryModel);
}

#[test]
fn seasonal_model_filters_like_its_expansion() {
    let spec = SarimaSpec::new(1, 0, 1).with_seasonal(4, 1, 0, 1);
    let sarima = SarimaModel::new(spec, &[-0.3], &[0.2], &[-0.5], &[0.4], 1.0).unwrap();
    let arma = sarima.to_arma().unwrap();
    let (ar, ma) = (arma.ar(), arma.ma());
    let y = generate_arma(&ar.coefficients()[1..], &ma.coefficients()[1..], 80, 31);
    let a = ArmaKf::new(&sarima).unwrap().process(&y).unwrap();
    let b = ArmaKf::new(&arma).unwrap().process(&y).unwrap();
    assert_abs_diff_eq!(a.ssq(), b.ssq(), epsilon = 1e-12);
    assert_abs_diff_eq!(a.log_determinant(), b.log_determinant(), epsilon = 1e-12);
}
