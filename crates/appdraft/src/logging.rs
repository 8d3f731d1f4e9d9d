//! Logging bootstrap for binaries embedding the engine.

use tracing_subscriber::EnvFilter;

/// Initializes `tracing` logging with options from the environment variable
/// given in the `env` parameter.
///
/// We force callers to provide a variable name so it can be different per
/// embedding application, e.g. `APPDRAFT_LOG`. If the variable is not set,
/// the maximum log level is INFO.
pub fn initialize_logging(env: &str) {
    let filter =
        EnvFilter::try_from_env(env).unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
