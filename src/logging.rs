use tracing_subscriber::EnvFilter;

/// Workspace crates whose events are shown.
const CRATE_TARGETS: &[&str] = &[
    "saga",
    "saga_math",
    "saga_arima",
    "saga_ssf",
    "saga_benchmarking",
];

/// Installs the global subscriber.
///
/// `-v` selects info, `-vv` debug and `-vvv` trace; warnings only by
/// default. A `RUST_LOG` directive replaces the whole filter.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let directives = CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
