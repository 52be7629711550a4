//! Diagnostic output for the server process.
//!
//! Events go to stderr; stdout is reserved for protocol frames. The subscriber
//! is assembled from a registry with one formatting layer, chosen by
//! [`LogFormat`], and an [`EnvFilter`] built from the configured filter.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::fmt::{self, MakeWriter, time::UtcTime};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use langsrv_config::{Config, LogFormat};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that the global subscriber is in place.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter '{filter}': {reason}")]
    Filter {
        /// Expression as configured.
        filter: String,
        /// Parser message.
        reason: String,
    },
    /// Another global subscriber was installed first.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] SetGlobalDefaultError),
}

/// Installs the stderr subscriber once per process.
///
/// Only the first call has an effect; later calls hand out another
/// [`TelemetryHandle`] and keep the original filter and format.
///
/// # Errors
///
/// Returns a [`TelemetryError`] when the filter is invalid or a different
/// subscriber already owns the global slot.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| {
            let ansi = !config.log_format().is_structured() && io::stderr().is_terminal();
            let subscriber = build_subscriber(config, io::stderr, ansi)?;
            tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
        })
        .map(|_| TelemetryHandle)
}

/// Builds a subscriber writing formatted events to `writer`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when `log_filter` does not parse.
pub fn build_subscriber<W>(
    config: &Config,
    writer: W,
    ansi: bool,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            reason: error.to_string(),
        })?;

    let events = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(ansi)
        .with_timer(UtcTime::rfc_3339());
    let format: Box<dyn Layer<Registry> + Send + Sync> = match config.log_format() {
        LogFormat::Json => events.json().flatten_event(true).boxed(),
        LogFormat::Compact => events.compact().boxed(),
    };

    Ok(Box::new(
        tracing_subscriber::registry().with(format).with(filter),
    ))
}
