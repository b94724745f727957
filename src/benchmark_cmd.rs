//! Benchmark command: multivariate Cholette benchmarking of inline series.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, info_span};

use saga_benchmarking::{MultivariateCholetteProcessor, TemporalConstraint, TsData};
use saga_ssf::CovarianceCache;

use crate::cli::BenchmarkArgs;
use crate::config::{self, BenchmarkToml};
use crate::convert;

/// Run the benchmarking pipeline.
pub fn run(args: BenchmarkArgs) -> Result<()> {
    let _cmd = info_span!("benchmark").entered();
    let cfg: BenchmarkToml = config::load(&args.config)?;
    let output = benchmark(&cfg)?;

    match args.output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("failed to create output: {}", path.display()))?;
            write_csv(&output, file)
                .with_context(|| format!("failed to write output: {}", path.display()))?;
            info!(path = %path.display(), "results written");
        }
        None => write_csv(&output, io::stdout().lock())?,
    }
    Ok(())
}

/// Runs the processor on the configured series and constraints.
fn benchmark(cfg: &BenchmarkToml) -> Result<BTreeMap<String, TsData>> {
    let spec = convert::build_cholette_spec(&cfg.cholette)?;
    let series = convert::build_series_map(&cfg.series)?;
    let contemporaneous = convert::parse_contemporaneous(&cfg.contemporaneous)?;
    let temporal = convert::parse_temporal(&cfg.temporal)?;
    info!(
        series = series.len(),
        contemporaneous = contemporaneous.len(),
        temporal = temporal.len(),
        "benchmarking"
    );

    let cache = Arc::new(CovarianceCache::new(cfg.cache_capacity));
    let processor = MultivariateCholetteProcessor::new(spec)?.with_cache(Arc::clone(&cache));
    let output = processor
        .process(&series, &contemporaneous, &temporal)
        .context("benchmarking failed")?;
    let stats = cache.stats();
    debug!(hits = stats.hits, misses = stats.misses, "covariance cache");

    for tc in &temporal {
        let discrepancy = temporal_discrepancy(&output, tc)?;
        info!(constraint = %tc, discrepancy, "temporal constraint");
    }
    Ok(output)
}

/// Largest gap between the aggregated detail and its benchmarks.
fn temporal_discrepancy(output: &BTreeMap<String, TsData>, tc: &TemporalConstraint) -> Result<f64> {
    let benchmarks = &output[&tc.aggregate];
    let aggregated = output[&tc.detail]
        .aggregate(benchmarks.freq(), tc.aggregation)
        .with_context(|| format!("cannot aggregate '{}'", tc.detail))?;
    let common = aggregated.window(&benchmarks.domain());
    let gap = common
        .values()
        .iter()
        .zip(benchmarks.fit_to(&common.domain()).values())
        .filter(|(_, y)| y.is_finite())
        .map(|(a, y)| (a - y).abs())
        .fold(0.0, f64::max);
    Ok(gap)
}

#[derive(Serialize)]
struct Row<'a> {
    series: &'a str,
    period: String,
    value: Option<f64>,
}

/// Long-format CSV: `series,period,value`, missing values left empty.
fn write_csv<W: Write>(output: &BTreeMap<String, TsData>, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (name, data) in output {
        let domain = data.domain();
        for (i, &v) in data.values().iter().enumerate() {
            wtr.serialize(Row {
                series: name,
                period: domain.get(i).to_string(),
                value: (!v.is_nan()).then_some(v),
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}
