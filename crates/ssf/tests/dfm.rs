//! Integration tests: smoothing a dynamic factor model against direct
//! Gaussian conditioning.

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2, array};
use saga_math::linalg;
use saga_ssf::{
    CovarianceCache, Dynamics, MeasurementDescriptor, MeasurementKind, Measurements, SsfDfm,
    VarDescriptor,
};

fn model() -> (VarDescriptor, Vec<MeasurementDescriptor>) {
    let var = VarDescriptor::new(
        2,
        1,
        array![[0.6, 0.2], [-0.1, 0.4]],
        array![[1.0, 0.3], [0.3, 0.5]],
    )
    .unwrap();
    let measurements = vec![
        MeasurementDescriptor::new(MeasurementKind::Level, vec![1.0, 0.5], 0.2),
        MeasurementDescriptor::new(MeasurementKind::Cumulated { length: 2 }, vec![f64::NAN, 1.0], 0.1),
        MeasurementDescriptor::new(MeasurementKind::Level, vec![0.0, 1.0], 0.3),
    ];
    (var, measurements)
}

fn data() -> Array2<f64> {
    array![
        [0.5, 1.0, f64::NAN],
        [1.5, f64::NAN, 0.2],
        [-0.3, 0.4, -1.0],
        [0.0, f64::NAN, f64::NAN],
        [0.8, 1.2, 0.6],
    ]
}

/// `cov(x_t, x_s)` of the stationary state.
fn state_cov(t_mat: &Array2<f64>, p0: &Array2<f64>, t: usize, s: usize) -> Array2<f64> {
    if t < s {
        return state_cov(t_mat, p0, s, t).t().to_owned();
    }
    let mut c = p0.clone();
    for _ in s..t {
        c = t_mat.dot(&c);
    }
    c
}

#[test]
fn smoother_matches_gaussian_conditioning() {
    let (var, descriptors) = model();
    let dfm = SsfDfm::from_descriptors(var, 2, descriptors.clone()).unwrap();
    let y = data();
    let n = y.nrows();
    let dim = dfm.dim();

    let mut t_mat = Array2::zeros((dim, dim));
    dfm.dynamics.t(0, t_mat.view_mut());
    let p0 = dfm.initialization.covariance().clone();
    let z = dfm.measurements.z_matrix().clone();

    let obs: Vec<(usize, usize)> = (0..n)
        .flat_map(|t| (0..y.ncols()).map(move |i| (t, i)))
        .filter(|&(t, i)| !y[[t, i]].is_nan())
        .collect();
    let m = obs.len();

    let mut syy = Array2::<f64>::zeros((m, m));
    for (a, &(t, i)) in obs.iter().enumerate() {
        for (b, &(s, j)) in obs.iter().enumerate() {
            let c = state_cov(&t_mat, &p0, t, s);
            syy[[a, b]] = z.row(i).dot(&c.dot(&z.row(j)));
            if a == b {
                syy[[a, b]] += descriptors[i].var;
            }
        }
    }
    let yv: Vec<f64> = obs.iter().map(|&(t, i)| y[[t, i]]).collect();
    let w = linalg::solve_spd(syy.view(), &yv).unwrap();

    let smoothed = dfm.smooth(y.view()).unwrap();
    for t in 0..n {
        let mut expected = Array1::<f64>::zeros(dim);
        for (b, &(s, j)) in obs.iter().enumerate() {
            let c = state_cov(&t_mat, &p0, t, s);
            expected.scaled_add(w[b], &c.dot(&z.row(j)));
        }
        for k in 0..dim {
            assert_abs_diff_eq!(smoothed.states()[[t, k]], expected[k], epsilon = 1e-9);
        }
    }

    let mut l = syy.clone();
    linalg::cholesky(l.view_mut()).unwrap();
    let logdet: f64 = 2.0 * l.diag().iter().map(|v| v.ln()).sum::<f64>();
    let quad: f64 = yv.iter().zip(w.iter()).map(|(a, b)| a * b).sum();
    let expected = -0.5 * (m as f64 * (2.0 * std::f64::consts::PI).ln() + logdet + quad);
    assert_abs_diff_eq!(smoothed.log_likelihood(), expected, epsilon = 1e-9);
    assert_eq!(smoothed.summary().observations, m);
    assert_eq!(smoothed.summary().skipped, 0);
}

#[test]
fn cached_model_smooths_identically() {
    let (var, descriptors) = model();
    let cache = CovarianceCache::default();
    let plain = SsfDfm::from_descriptors(var.clone(), 2, descriptors.clone()).unwrap();
    let first = SsfDfm::from_descriptors_cached(var.clone(), 2, descriptors.clone(), &cache).unwrap();
    let second = SsfDfm::from_descriptors_cached(var, 2, descriptors, &cache).unwrap();
    assert_eq!(cache.stats().hits, 1);

    let y = data();
    let a = plain.smooth(y.view()).unwrap();
    let b = first.smooth(y.view()).unwrap();
    let c = second.smooth(y.view()).unwrap();
    assert_eq!(a.states(), b.states());
    assert_eq!(b.states(), c.states());
}

#[test]
fn measurement_count_matches_data() {
    let (var, descriptors) = model();
    let dfm = SsfDfm::from_descriptors(var, 2, descriptors).unwrap();
    assert_eq!(dfm.measurements.count(), data().ncols());
}
