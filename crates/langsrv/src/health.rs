//! Lifecycle reporting for the server process.

use std::sync::Arc;

use langsrv_config::Config;
use langsrv_server::{ServeError, SessionExit};

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer for process lifecycle events.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked when the server starts reading from the client.
    fn session_started(&self);

    /// Invoked when the session ends, cleanly or not.
    fn session_ended(&self, exit: SessionExit);

    /// Invoked when the transport fails.
    fn session_failed(&self, error: &ServeError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn session_started(&self) {
        (**self).session_started();
    }

    fn session_ended(&self, exit: SessionExit) {
        (**self).session_ended(exit);
    }

    fn session_failed(&self, error: &ServeError) {
        (**self).session_failed(error);
    }
}

/// Reporter that records lifecycle events with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting language server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            jsonrpc_version = %config.version_policy(),
            analyzer = config.analyzer_command().unwrap_or("disabled"),
            build_manifest = %config.build_manifest(),
            "language server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "language server bootstrap failed"
        );
    }

    fn session_started(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_started",
            "serving stdio"
        );
    }

    fn session_ended(&self, exit: SessionExit) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_ended",
            exit = ?exit,
            code = exit.code(),
            "session ended"
        );
    }

    fn session_failed(&self, error: &ServeError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "session_failed",
            error = %error,
            "transport failed"
        );
    }
}
