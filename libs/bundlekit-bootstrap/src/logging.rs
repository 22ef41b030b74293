use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Build the filter: `RUST_LOG` wins, otherwise the configured level directive.
///
/// # Errors
/// Returns an error if the configured directive is not a valid `EnvFilter`.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid logging level '{}'", config.level))
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// command output.
///
/// Calling it again (e.g. from tests) keeps the first subscriber.
///
/// # Errors
/// Returns an error if the configured level is invalid.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let installed = match config.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("global subscriber already installed, keeping it");
    }
    Ok(())
}
