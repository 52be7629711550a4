//! Server bootstrap: configuration, telemetry, and collaborator wiring.

use std::env;
use std::ffi::{OsStr, OsString};
use std::io::{Read, Write};
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use langsrv_backend::{BuildManifestResolver, ProcessAnalyzer};
use langsrv_config::Config;
use langsrv_server::{Dispatcher, ServeError, SessionExit};

use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Source of the server configuration.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when any configuration source is invalid.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader reading defaults, files, environment, and process arguments.
///
/// Transport flags that language clients append when launching a server are
/// removed before the arguments reach the configuration parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(without_client_flags(env::args_os()))
    }
}

/// Drops `--stdio` and `--clientProcessId=<pid>` from `args`.
///
/// Stdio is the only transport, and the client process id is not used.
#[must_use]
pub fn without_client_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .filter(|arg| !is_client_flag(arg))
        .collect()
}

fn is_client_flag(arg: &OsStr) -> bool {
    arg.to_str().is_some_and(|flag| {
        flag == "--stdio" || flag.starts_with("--clientProcessId=")
    })
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Bootstrapped server ready to serve one client.
pub struct LanguageServer {
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl LanguageServer {
    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Telemetry handle, mostly useful in tests.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Builds a dispatcher wired to the configured collaborators.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        let mut dispatcher = Dispatcher::new(self.config.version_policy())
            .with_resolver(Box::new(BuildManifestResolver::from_config(&self.config)));
        if let Some(analyzer) = ProcessAnalyzer::from_config(&self.config) {
            dispatcher = dispatcher.with_analysis(Box::new(analyzer));
        }
        dispatcher
    }

    /// Serves one session over `source` and `sink`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServeError`] when the transport fails.
    pub fn serve<R: Read, W: Write>(&self, source: R, sink: W) -> Result<SessionExit, ServeError> {
        self.reporter.session_started();
        let outcome = self.dispatcher().serve(source, sink);
        match &outcome {
            Ok(exit) => self.reporter.session_ended(*exit),
            Err(error) => self.reporter.session_failed(error),
        }
        outcome
    }
}

/// Bootstraps the server using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] when configuration or telemetry fails. The
/// failure is reported to `reporter` before returning.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<LanguageServer, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(LanguageServer {
        config,
        telemetry,
        reporter,
    })
}
