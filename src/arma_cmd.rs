//! Arma command: exact likelihood of a stationary ARMA model.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use saga_arima::{ArmaKf, EvaluationCounter, LinearModel};

use crate::cli::ArmaArgs;
use crate::config::{self, ArmaToml};
use crate::convert;

/// Run the likelihood evaluation.
pub fn run(args: ArmaArgs) -> Result<()> {
    let _cmd = info_span!("arma").entered();
    let cfg: ArmaToml = config::load(&args.config)?;
    let report = evaluate(&cfg, args.epsilon)?;
    print!("{report}");
    Ok(())
}

/// Evaluates the model of `cfg` and formats a plain-text report.
fn evaluate(cfg: &ArmaToml, epsilon: Option<f64>) -> Result<String> {
    let model = convert::build_model(&cfg.model)?;
    let nparams = model.spec().parameters_count();
    let counter = Arc::new(EvaluationCounter::new());
    let kf = ArmaKf::new(&model)
        .context("model rejected")?
        .with_epsilon(epsilon.unwrap_or(cfg.epsilon))
        .with_counter(Arc::clone(&counter));
    info!(n = cfg.data.len(), dim = kf.dim(), "evaluating likelihood");

    let ll = kf.process(&cfg.data).context("exact filter failed")?;
    let fast_bic = kf
        .fast_processing(&cfg.data, nparams)
        .context("fast filter failed")?;

    let mut out = String::new();
    writeln!(out, "observations        {}", ll.n())?;
    writeln!(out, "innovation variance {}", model.innovation_variance())?;
    writeln!(out, "ssq                 {:.10}", ll.ssq())?;
    writeln!(out, "log determinant     {:.10}", ll.log_determinant())?;
    writeln!(out, "sigma2              {:.10}", ll.sigma2())?;
    writeln!(out, "log likelihood      {:.10}", ll.log_likelihood())?;
    writeln!(out, "aic                 {:.10}", ll.aic(nparams))?;
    writeln!(out, "bic                 {:.10}", ll.bic(nparams))?;
    writeln!(out, "fast criterion      {:.10}", fast_bic)?;
    writeln!(out, "evaluations         {}", counter.get())?;
    Ok(out)
}
