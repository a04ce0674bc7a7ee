#![forbid(unsafe_code)]

//! Structured JSON logging (feature `tracing-json`).
//!
//! The filter is read from `CONFIGDOC_LOG`, then `RUST_LOG`, and defaults to
//! `warn`. Directives use the `tracing_subscriber::EnvFilter` syntax, e.g.
//! `CONFIGDOC_LOG=configdoc_core=trace`.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted first for the log filter.
pub const LOG_ENV: &str = "CONFIGDOC_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Error returned when a global subscriber is already installed.
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install a JSON formatting subscriber as the global default.
///
/// Fails if a global subscriber is already set.
pub fn init() -> Result<(), InitError> {
    let directive = filter_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let filter =
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()?;
    tracing::debug!(%directive, "configdoc logging initialized");
    Ok(())
}

/// Pick the filter directive: the first non-blank of `configdoc_log` and
/// `rust_log`, else `warn`.
#[must_use]
pub fn filter_directive(configdoc_log: Option<String>, rust_log: Option<String>) -> String {
    configdoc_log
        .into_iter()
        .chain(rust_log)
        .map(|s| s.trim().to_owned())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_owned())
}
