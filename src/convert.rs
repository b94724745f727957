//! Pure conversion functions: TOML config structs -> crate API types.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};

use saga_arima::{SarimaModel, SarimaSpec};
use saga_benchmarking::{
    BiasCorrection, CholetteSpec, ContemporaneousConstraint, TemporalConstraint, TsData, TsFrequency,
    TsPeriod,
};

use crate::config::{CholetteToml, ModelToml, SeriesToml};

/// Parses a bias correction name.
pub fn parse_bias(s: &str) -> Result<BiasCorrection> {
    match s.to_lowercase().as_str() {
        "none" => Ok(BiasCorrection::None),
        "additive" => Ok(BiasCorrection::Additive),
        "multiplicative" => Ok(BiasCorrection::Multiplicative),
        other => bail!("unknown bias correction: {other:?}"),
    }
}

/// Builds a validated [`CholetteSpec`].
pub fn build_cholette_spec(cholette: &CholetteToml) -> Result<CholetteSpec> {
    let spec = CholetteSpec::new()
        .with_rho(cholette.rho)
        .with_lambda(cholette.lambda)
        .with_bias(parse_bias(&cholette.bias)?);
    spec.validate()?;
    Ok(spec)
}

/// Builds the (seasonal) ARMA model of the `[model]` table.
pub fn build_model(model: &ModelToml) -> Result<SarimaModel> {
    let mut spec = SarimaSpec::new(model.phi.len(), 0, model.theta.len());
    if model.period > 1 || !model.seasonal_phi.is_empty() || !model.seasonal_theta.is_empty() {
        spec = spec.with_seasonal(model.period, model.seasonal_phi.len(), 0, model.seasonal_theta.len());
    }
    let built = SarimaModel::new(
        spec,
        &model.phi,
        &model.theta,
        &model.seasonal_phi,
        &model.seasonal_theta,
        model.variance,
    )?;
    Ok(built)
}

/// Converts one `[series.<name>]` table.
pub fn build_series(name: &str, series: &SeriesToml) -> Result<TsData> {
    let Some(freq) = TsFrequency::from_periods_per_year(series.frequency) else {
        bail!(
            "series {name:?}: unsupported frequency {} (expected 1, 2, 3, 4, 6 or 12)",
            series.frequency
        );
    };
    if series.start_period == 0 || series.start_period > series.frequency {
        bail!(
            "series {name:?}: start_period {} outside 1..={}",
            series.start_period,
            series.frequency
        );
    }
    let start = TsPeriod::new(freq, series.start_year, series.start_period - 1);
    Ok(TsData::new(start, series.values.clone()))
}

/// Converts all series tables.
pub fn build_series_map(series: &BTreeMap<String, SeriesToml>) -> Result<BTreeMap<String, TsData>> {
    series
        .iter()
        .map(|(name, s)| Ok((name.clone(), build_series(name, s)?)))
        .collect()
}

/// Parses contemporaneous constraint strings.
pub fn parse_contemporaneous(texts: &[String]) -> Result<Vec<ContemporaneousConstraint>> {
    texts
        .iter()
        .map(|t| ContemporaneousConstraint::parse(t).with_context(|| format!("in constraint {t:?}")))
        .collect()
}

/// Parses temporal constraint strings.
pub fn parse_temporal(texts: &[String]) -> Result<Vec<TemporalConstraint>> {
    texts
        .iter()
        .map(|t| TemporalConstraint::parse(t).with_context(|| format!("in constraint {t:?}")))
        .collect()
}
