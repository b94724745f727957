//! Univariate Cholette benchmarking of one series on a low-frequency aggregate.

use ndarray::Array2;
use saga_ssf::CovarianceCache;
use tracing::debug;

use crate::constraint::Aggregation;
use crate::error::BenchmarkError;
use crate::series::{TsData, TsDomain};
use crate::spec::{BiasCorrection, CholetteSpec};
use crate::ssf_cholette::{CholetteSystem, Term};

/// Benchmarks `series` so that its aggregation matches `aggregate` on every
/// complete aggregate period covered by the series.
///
/// Periods of `aggregate` holding NaN are not binding. The result has the
/// domain of `series`.
///
/// # Errors
///
/// - [`BenchmarkError::InvalidSpec`] when `spec` does not validate.
/// - [`BenchmarkError::IncompatibleFrequency`] when the frequency of
///   `series` is not a multiple of the frequency of `aggregate`.
/// - [`BenchmarkError::MissingValues`] when `series` contains NaN.
/// - [`BenchmarkError::Infeasible`] when a benchmark falls on sub-periods
///   that all have a zero weight.
pub fn benchmark(
    series: &TsData,
    aggregate: &TsData,
    aggregation: Aggregation,
    spec: &CholetteSpec,
) -> Result<TsData, BenchmarkError> {
    benchmark_named("series", series, aggregate, aggregation, spec, None)
}

pub(crate) fn benchmark_named(
    name: &str,
    series: &TsData,
    aggregate: &TsData,
    aggregation: Aggregation,
    spec: &CholetteSpec,
    cache: Option<&CovarianceCache>,
) -> Result<TsData, BenchmarkError> {
    spec.validate()?;
    let k = ratio(name, series.domain(), aggregate.domain())?;
    if series.values().iter().any(|v| v.is_nan()) {
        return Err(BenchmarkError::MissingValues { name: name.to_string() });
    }

    let domain = series.domain();
    let links = temporal_links(&domain, aggregate, k);
    let terms = temporal_terms(0, k, aggregation);
    let mut x = series.values().to_vec();
    correct_bias(&mut x, &links, &terms, spec.bias());
    if links.is_empty() {
        debug!(name, "no binding aggregate period");
        return Ok(TsData::new(domain.start(), x));
    }

    let n = x.len();
    let mut targets = Array2::from_elem((n, 1), f64::NAN);
    for &(end, y) in &links {
        targets[[end, 0]] = y - aggregate_at(&x, end, &terms);
    }
    let weights = Array2::from_shape_fn((n, 1), |(t, _)| spec.weight(x[t]));
    let system = CholetteSystem {
        weights,
        equations: vec![terms],
        targets,
    };
    let corrections = system.solve(spec.rho(), cache)?;
    for (v, c) in x.iter_mut().zip(corrections.column(0)) {
        *v += c;
    }
    debug!(name, n, k, benchmarks = links.len(), "series benchmarked");
    Ok(TsData::new(domain.start(), x))
}

/// Number of detail periods per aggregate period.
pub(crate) fn ratio(name: &str, detail: TsDomain, aggregate: TsDomain) -> Result<usize, BenchmarkError> {
    detail
        .freq()
        .ratio(aggregate.freq())
        .ok_or_else(|| BenchmarkError::IncompatibleFrequency {
            name: name.to_string(),
            detail: detail.freq().periods_per_year(),
            aggregate: aggregate.freq().periods_per_year(),
        })
}

/// `(position of the last sub-period, aggregate value)` of every known
/// aggregate period whose sub-periods all lie in `domain`.
pub(crate) fn temporal_links(domain: &TsDomain, aggregate: &TsData, k: usize) -> Vec<(usize, f64)> {
    let adom = aggregate.domain();
    aggregate
        .values()
        .iter()
        .enumerate()
        .filter(|(_, y)| y.is_finite())
        .filter_map(|(j, &y)| {
            let first = adom.get(j).first_of(domain.freq())?;
            domain.index_of(&first)?;
            let end = domain.index_of(&first.plus(k as i64 - 1))?;
            Some((end, y))
        })
        .collect()
}

/// Non-zero terms of the aggregation of `k` sub-periods of variable `var`,
/// expressed as lags from the last sub-period.
pub(crate) fn temporal_terms(var: usize, k: usize, aggregation: Aggregation) -> Vec<Term> {
    (0..k)
        .filter_map(|lag| {
            let coef = aggregation.weight(lag, k);
            (coef != 0.0).then_some(Term { var, lag, coef })
        })
        .collect()
}

/// Aggregation of `x` ending at `end`.
pub(crate) fn aggregate_at(x: &[f64], end: usize, terms: &[Term]) -> f64 {
    terms.iter().map(|t| t.coef * x[end - t.lag]).sum()
}

/// Level adjustment applied by a bias correction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum BiasAdjustment {
    Shift(f64),
    Scale(f64),
}

impl BiasAdjustment {
    pub(crate) fn apply(self, v: f64) -> f64 {
        match self {
            BiasAdjustment::Shift(b) => v + b,
            BiasAdjustment::Scale(b) => v * b,
        }
    }
}

/// Corrects the level of `x` so that it matches the benchmarks on average,
/// and returns the adjustment for use on values outside `x`.
pub(crate) fn correct_bias(
    x: &mut [f64],
    links: &[(usize, f64)],
    terms: &[Term],
    bias: BiasCorrection,
) -> Option<BiasAdjustment> {
    if links.is_empty() {
        return None;
    }
    let adjustment = match bias {
        BiasCorrection::None => return None,
        BiasCorrection::Additive => {
            let discrepancy: f64 = links.iter().map(|&(end, y)| y - aggregate_at(x, end, terms)).sum();
            let mass: f64 = terms.iter().map(|t| t.coef).sum::<f64>() * links.len() as f64;
            if mass == 0.0 {
                return None;
            }
            let b = discrepancy / mass;
            debug!(bias = b, "additive bias correction");
            BiasAdjustment::Shift(b)
        }
        BiasCorrection::Multiplicative => {
            let target: f64 = links.iter().map(|&(_, y)| y).sum();
            let current: f64 = links.iter().map(|&(end, _)| aggregate_at(x, end, terms)).sum();
            if current == 0.0 {
                return None;
            }
            let b = target / current;
            debug!(bias = b, "multiplicative bias correction");
            BiasAdjustment::Scale(b)
        }
    };
    x.iter_mut().for_each(|v| *v = adjustment.apply(*v));
    Some(adjustment)
}
