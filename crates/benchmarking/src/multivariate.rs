//! Multivariate Cholette benchmarking under contemporaneous and temporal
//! constraints.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use ndarray::Array2;
use saga_ssf::CovarianceCache;
use tracing::{debug, info, instrument};

use crate::cholette::{aggregate_at, benchmark_named, correct_bias, ratio, temporal_links, temporal_terms};
use crate::constraint::{ContemporaneousConstraint, TemporalConstraint, Total};
use crate::error::BenchmarkError;
use crate::series::{TsData, TsDomain};
use crate::spec::CholetteSpec;
use crate::ssf_cholette::{CholetteSystem, Term};

/// Validated constraints.
#[derive(Debug)]
struct Info {
    /// Contemporaneous constraints with wildcards resolved.
    contemporaneous: Vec<ContemporaneousConstraint>,
    /// Temporal constraints by detail series.
    temporal: BTreeMap<String, TemporalConstraint>,
}

/// Series benchmarked jointly.
#[derive(Debug)]
struct Maps {
    variables: Vec<String>,
    index: HashMap<String, usize>,
}

/// Benchmarks a set of series so that they satisfy contemporaneous
/// (`t = a + b`) and temporal (`y = sum(x)`) constraints simultaneously.
///
/// Series that carry a temporal constraint but never appear as a component
/// of a contemporaneous constraint are benchmarked alone first; totals in
/// that situation then act as fixed targets. The components are solved
/// jointly as one state-space system over their common periods.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use saga_benchmarking::{
///     CholetteSpec, ContemporaneousConstraint, MultivariateCholetteProcessor, TsData,
///     TsFrequency, TsPeriod,
/// };
///
/// let start = TsPeriod::new(TsFrequency::Quarterly, 2020, 0);
/// let mut input = BTreeMap::new();
/// input.insert("t".to_string(), TsData::new(start, vec![10.0, 10.0, 10.0, 10.0]));
/// input.insert("a".to_string(), TsData::new(start, vec![4.0, 4.0, 4.0, 4.0]));
/// input.insert("b".to_string(), TsData::new(start, vec![4.0, 4.0, 4.0, 4.0]));
///
/// let constraints = vec![ContemporaneousConstraint::parse("t = a + b").unwrap()];
/// let processor = MultivariateCholetteProcessor::new(CholetteSpec::new()).unwrap();
/// let out = processor.process(&input, &constraints, &[]).unwrap();
/// assert!((out["a"].values()[0] - 5.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct MultivariateCholetteProcessor {
    spec: CholetteSpec,
    cache: Option<Arc<CovarianceCache>>,
}

impl MultivariateCholetteProcessor {
    /// Processor using `spec`.
    ///
    /// # Errors
    ///
    /// [`BenchmarkError::InvalidSpec`] when `spec` does not validate.
    pub fn new(spec: CholetteSpec) -> Result<Self, BenchmarkError> {
        spec.validate()?;
        Ok(Self { spec, cache: None })
    }

    /// Shares a steady-state covariance cache across runs.
    pub fn with_cache(mut self, cache: Arc<CovarianceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Parameters.
    pub fn spec(&self) -> &CholetteSpec {
        &self.spec
    }

    /// Benchmarks `input`.
    ///
    /// Returns every input series; benchmarked ones keep their domain and
    /// are corrected on the periods where their constraints apply. A bias
    /// correction shifts or scales the whole series.
    ///
    /// # Errors
    ///
    /// - [`BenchmarkError::UnknownSeries`], [`BenchmarkError::SelfReference`],
    ///   [`BenchmarkError::CircularConstraint`],
    ///   [`BenchmarkError::DuplicateConstraint`] or
    ///   [`BenchmarkError::InvalidConstraint`] for inconsistent constraints.
    /// - [`BenchmarkError::IncompatibleFrequency`] or
    ///   [`BenchmarkError::EmptyDomain`] when the series cannot be aligned.
    /// - [`BenchmarkError::MissingValues`] when a benchmarked series has NaN
    ///   in its common domain.
    /// - [`BenchmarkError::Infeasible`] when a binding constraint cannot be
    ///   met, e.g. when all its series are zero with `lambda > 0`.
    /// - [`BenchmarkError::Ssf`] when the state-space computation fails.
    #[instrument(skip_all, fields(series = input.len(), contemporaneous = contemporaneous.len(), temporal = temporal.len()))]
    pub fn process(
        &self,
        input: &BTreeMap<String, TsData>,
        contemporaneous: &[ContemporaneousConstraint],
        temporal: &[TemporalConstraint],
    ) -> Result<BTreeMap<String, TsData>, BenchmarkError> {
        let info = load_info(input, contemporaneous, temporal)?;
        let maps = build_maps(&info);
        let cache = self.cache.as_deref();

        let mut output = input.clone();
        for (detail, tc) in &info.temporal {
            if maps.index.contains_key(detail) {
                continue;
            }
            let benchmarked = benchmark_named(
                detail,
                &input[detail],
                &input[&tc.aggregate],
                tc.aggregation,
                &self.spec,
                cache,
            )?;
            output.insert(detail.clone(), benchmarked);
        }
        if maps.variables.is_empty() {
            return Ok(output);
        }

        let domain = build_domain(&info, &maps, &output)?;
        let mut x = Array2::zeros((domain.len(), maps.variables.len()));
        let mut adjustments = vec![None; maps.variables.len()];
        for (j, name) in maps.variables.iter().enumerate() {
            let values = output[name].fit_to(&domain);
            if values.values().iter().any(|v| v.is_nan()) {
                return Err(BenchmarkError::MissingValues { name: name.clone() });
            }
            let mut column = values.values().to_vec();
            if let Some(tc) = info.temporal.get(name) {
                let k = ratio(name, domain, input[&tc.aggregate].domain())?;
                let links = temporal_links(&domain, &input[&tc.aggregate], k);
                adjustments[j] =
                    correct_bias(&mut column, &links, &temporal_terms(0, k, tc.aggregation), self.spec.bias());
            }
            x.column_mut(j).iter_mut().zip(column).for_each(|(dst, v)| *dst = v);
        }

        let weights = build_weights(&x, &self.spec);
        let (equations, targets) = build_constraints(&info, &maps, &domain, &x, input, &output)?;
        info!(
            variables = maps.variables.len(),
            equations = equations.len(),
            periods = domain.len(),
            "solving benchmarking system"
        );
        let system = CholetteSystem {
            weights,
            equations,
            targets,
        };
        let corrections = system.solve(self.spec.rho(), cache)?;

        for (j, name) in maps.variables.iter().enumerate() {
            let original = &output[name];
            let adjustment = adjustments[j];
            let values = (0..original.domain().len())
                .map(|i| {
                    let p = original.domain().get(i);
                    let v = original.values()[i];
                    match (domain.index_of(&p), adjustment) {
                        (Some(t), _) => x[[t, j]] + corrections[[t, j]],
                        (None, Some(adjustment)) => adjustment.apply(v),
                        (None, None) => v,
                    }
                })
                .collect();
            let benchmarked = TsData::new(original.domain().start(), values);
            output.insert(name.clone(), benchmarked);
        }
        Ok(output)
    }
}

/// Checks names, frequencies and the constraint graph, and resolves wildcards.
fn load_info(
    input: &BTreeMap<String, TsData>,
    contemporaneous: &[ContemporaneousConstraint],
    temporal: &[TemporalConstraint],
) -> Result<Info, BenchmarkError> {
    let known = |name: &str| {
        if input.contains_key(name) {
            Ok(())
        } else {
            Err(BenchmarkError::UnknownSeries { name: name.to_string() })
        }
    };

    let mut by_detail = BTreeMap::new();
    for tc in temporal {
        known(&tc.detail)?;
        known(&tc.aggregate)?;
        if tc.detail == tc.aggregate {
            return Err(BenchmarkError::SelfReference {
                name: tc.detail.clone(),
            });
        }
        ratio(&tc.detail, input[&tc.detail].domain(), input[&tc.aggregate].domain())?;
        if by_detail.insert(tc.detail.clone(), tc.clone()).is_some() {
            return Err(BenchmarkError::DuplicateConstraint {
                name: tc.detail.clone(),
            });
        }
    }
    let aggregates: BTreeSet<&str> = temporal.iter().map(|tc| tc.aggregate.as_str()).collect();
    if let Some(tc) = temporal.iter().find(|tc| aggregates.contains(tc.detail.as_str())) {
        return Err(BenchmarkError::InvalidConstraint {
            constraint: tc.to_string(),
            reason: format!("'{}' is itself a benchmark aggregate", tc.detail),
        });
    }

    let candidates: Vec<&str> = input
        .keys()
        .map(String::as_str)
        .filter(|name| !aggregates.contains(name))
        .collect();
    let mut expanded = Vec::with_capacity(contemporaneous.len());
    for c in contemporaneous {
        let c = c.expand(candidates.iter().copied())?;
        if let Total::Series(total) = c.total() {
            known(total)?;
            if c.components().iter().any(|(_, name)| name == total) {
                return Err(BenchmarkError::SelfReference { name: total.clone() });
            }
        }
        for (_, name) in c.components() {
            known(name)?;
            if aggregates.contains(name.as_str()) {
                return Err(BenchmarkError::InvalidConstraint {
                    constraint: c.to_string(),
                    reason: format!("'{name}' is a benchmark aggregate"),
                });
            }
        }
        expanded.push(c);
    }

    let totals: BTreeSet<&str> = expanded
        .iter()
        .filter_map(|c| match c.total() {
            Total::Series(name) => Some(name.as_str()),
            Total::Constant(_) => None,
        })
        .collect();
    for c in &expanded {
        if let Some((_, name)) = c.components().iter().find(|(_, name)| totals.contains(name.as_str())) {
            return Err(BenchmarkError::CircularConstraint { name: name.clone() });
        }
    }

    debug!(
        contemporaneous = expanded.len(),
        temporal = by_detail.len(),
        "constraints validated"
    );
    Ok(Info {
        contemporaneous: expanded,
        temporal: by_detail,
    })
}

/// Components of contemporaneous constraints, in order of first appearance.
fn build_maps(info: &Info) -> Maps {
    let mut variables = Vec::new();
    let mut index = HashMap::new();
    for c in &info.contemporaneous {
        for (_, name) in c.components() {
            if !index.contains_key(name) {
                index.insert(name.clone(), variables.len());
                variables.push(name.clone());
            }
        }
    }
    Maps { variables, index }
}

/// Common periods of the components and of the series totals.
fn build_domain(info: &Info, maps: &Maps, series: &BTreeMap<String, TsData>) -> Result<TsDomain, BenchmarkError> {
    let totals = info.contemporaneous.iter().filter_map(|c| match c.total() {
        Total::Series(name) => Some(name),
        Total::Constant(_) => None,
    });
    let mut names = maps.variables.iter().chain(totals);
    let Some(first) = names.next() else {
        return Err(BenchmarkError::EmptyDomain);
    };
    let mut domain = series[first].domain();
    for name in names {
        let other = series[name].domain();
        if other.freq() != domain.freq() {
            return Err(BenchmarkError::IncompatibleFrequency {
                name: name.clone(),
                detail: other.freq().periods_per_year(),
                aggregate: domain.freq().periods_per_year(),
            });
        }
        domain = domain.intersection(&other);
    }
    if domain.is_empty() {
        return Err(BenchmarkError::EmptyDomain);
    }
    debug!(start = %domain.start(), len = domain.len(), "common domain");
    Ok(domain)
}

fn build_weights(x: &Array2<f64>, spec: &CholetteSpec) -> Array2<f64> {
    x.mapv(|v| spec.weight(v))
}

/// Equations on the corrections and their targets, rewritten as the
/// residuals left by the current values.
fn build_constraints(
    info: &Info,
    maps: &Maps,
    domain: &TsDomain,
    x: &Array2<f64>,
    input: &BTreeMap<String, TsData>,
    output: &BTreeMap<String, TsData>,
) -> Result<(Vec<Vec<Term>>, Array2<f64>), BenchmarkError> {
    let n = domain.len();
    let mut equations = Vec::new();
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for c in &info.contemporaneous {
        let terms: Vec<Term> = c
            .components()
            .iter()
            .map(|(coef, name)| Term {
                var: maps.index[name],
                lag: 0,
                coef: *coef,
            })
            .collect();
        let total = match c.total() {
            Total::Series(name) => output[name].fit_to(domain).values().to_vec(),
            Total::Constant(v) => vec![*v; n],
        };
        let column = (0..n)
            .map(|t| total[t] - terms.iter().map(|term| term.coef * x[[t, term.var]]).sum::<f64>())
            .collect();
        equations.push(terms);
        columns.push(column);
    }

    for (j, name) in maps.variables.iter().enumerate() {
        let Some(tc) = info.temporal.get(name) else {
            continue;
        };
        let aggregate = &input[&tc.aggregate];
        let k = ratio(name, *domain, aggregate.domain())?;
        let links = temporal_links(domain, aggregate, k);
        if links.is_empty() {
            continue;
        }
        let terms = temporal_terms(j, k, tc.aggregation);
        let lagged = temporal_terms(0, k, tc.aggregation);
        let xj = x.column(j).to_vec();
        let mut column = vec![f64::NAN; n];
        for (end, y) in links {
            column[end] = y - aggregate_at(&xj, end, &lagged);
        }
        equations.push(terms);
        columns.push(column);
    }

    let targets = Array2::from_shape_fn((n, columns.len()), |(t, i)| columns[i][t]);
    Ok((equations, targets))
}
