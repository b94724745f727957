use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Reads and parses a TOML file.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config: {}", path.display()))
}

/// `saga arma` input.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArmaToml {
    /// Observations.
    pub data: Vec<f64>,

    /// Convergence threshold of the filter.
    #[serde(default)]
    pub epsilon: f64,

    /// Model coefficients.
    pub model: ModelToml,
}

/// Stationary (seasonal) ARMA model; coefficients follow `1 + φ1 B + ..`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    #[serde(default)]
    pub phi: Vec<f64>,
    #[serde(default)]
    pub theta: Vec<f64>,
    #[serde(default = "default_period")]
    pub period: usize,
    #[serde(default)]
    pub seasonal_phi: Vec<f64>,
    #[serde(default)]
    pub seasonal_theta: Vec<f64>,
    #[serde(default = "default_variance")]
    pub variance: f64,
}

fn default_period() -> usize {
    1
}
fn default_variance() -> f64 {
    1.0
}

/// `saga benchmark` input.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchmarkToml {
    #[serde(default)]
    pub cholette: CholetteToml,

    /// Contemporaneous constraints, e.g. `"t = a + b"`.
    #[serde(default)]
    pub contemporaneous: Vec<String>,

    /// Temporal constraints, e.g. `"y = sum(x)"`.
    #[serde(default)]
    pub temporal: Vec<String>,

    /// Capacity of the steady-state covariance cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Input series by name.
    pub series: BTreeMap<String, SeriesToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CholetteToml {
    #[serde(default = "default_rho")]
    pub rho: f64,
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    #[serde(default = "default_bias")]
    pub bias: String,
}

impl Default for CholetteToml {
    fn default() -> Self {
        Self {
            rho: default_rho(),
            lambda: default_lambda(),
            bias: default_bias(),
        }
    }
}

fn default_rho() -> f64 {
    0.9
}
fn default_lambda() -> f64 {
    1.0
}
fn default_bias() -> String {
    "none".to_string()
}
fn default_cache_capacity() -> usize {
    saga_ssf::DEFAULT_CACHE_CAPACITY
}

/// One regular series; `nan` marks missing values.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesToml {
    /// Periods per year (1, 2, 3, 4, 6 or 12).
    pub frequency: usize,
    pub start_year: i32,
    /// 1-based position of the first period in its year.
    #[serde(default = "default_start_period")]
    pub start_period: usize,
    pub values: Vec<f64>,
}

fn default_start_period() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn arma_defaults() {
        let cfg: ArmaToml = toml::from_str(
            r#"
            data = [1.0, 2.0]
            [model]
            phi = [-0.5]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.epsilon, 0.0);
        assert_eq!(cfg.model.period, 1);
        assert_eq!(cfg.model.variance, 1.0);
        assert!(cfg.model.theta.is_empty());
    }

    #[test]
    fn benchmark_defaults_and_nan() {
        let cfg: BenchmarkToml = toml::from_str(
            r#"
            contemporaneous = ["t = a + b"]
            [series.a]
            frequency = 4
            start_year = 2020
            values = [1.0, nan]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.cholette.rho, 0.9);
        assert_eq!(cfg.cholette.bias, "none");
        assert_eq!(cfg.cache_capacity, saga_ssf::DEFAULT_CACHE_CAPACITY);
        let a = &cfg.series["a"];
        assert_eq!(a.start_period, 1);
        assert!(a.values[1].is_nan());
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = toml::from_str::<ArmaToml>(
            r#"
            data = []
            seed = 3
            [model]
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data = [0.5]\n[model]\ntheta = [0.3]").unwrap();
        let cfg: ArmaToml = load(file.path()).unwrap();
        assert_eq!(cfg.model.theta, vec![0.3]);

        let missing = load::<ArmaToml>(Path::new("/nonexistent/arma.toml"));
        assert!(format!("{:#}", missing.unwrap_err()).contains("failed to read config"));
    }
}
