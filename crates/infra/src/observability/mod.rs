//! Tracing subscriber setup
//!
//! Hosts embedding the session call [`init_tracing`] once at startup. Library
//! code only emits `tracing` events; nothing here is required for the session
//! to work.

use grantflow_domain::{GrantflowError, LogConfig, LogFormat, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Filter from `RUST_LOG`, falling back to the configured level
fn env_filter(config: &LogConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|err| {
            let level = &config.level;
            GrantflowError::MissConfiguration(format!("invalid log level '{level}': {err}"))
        }),
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Output goes to stderr,
/// compact for [`LogFormat::Pretty`] and one JSON object per event for
/// [`LogFormat::Json`].
///
/// # Errors
/// Returns `GrantflowError::MissConfiguration` if the level directive is
/// invalid or a global subscriber is already installed
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let filter = env_filter(config)?;

    let output = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|err| {
            GrantflowError::MissConfiguration(format!("tracing already initialized: {err}"))
        })?;

    tracing::debug!(level = %config.level, format = ?config.format, "tracing initialized");
    Ok(())
}
