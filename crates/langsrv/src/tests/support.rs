//! Test doubles for bootstrap collaborators.

use std::ffi::OsString;
use std::sync::{Arc, Mutex};

use ortho_config::{OrthoConfig, OrthoError};

use langsrv_config::Config;
use langsrv_server::{ServeError, SessionExit};

use crate::bootstrap::{BootstrapError, ConfigLoader};
use crate::health::HealthReporter;

/// Structured health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    SessionStarted,
    SessionEnded(SessionExit),
    SessionFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn session_started(&self) {
        self.record(HealthEvent::SessionStarted);
    }

    fn session_ended(&self, exit: SessionExit) {
        self.record(HealthEvent::SessionEnded(exit));
    }

    fn session_failed(&self, error: &ServeError) {
        self.record(HealthEvent::SessionFailed(error.to_string()));
    }
}

/// Loader that rejects an invalid command-line value.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter([
            OsString::from("langsrv"),
            OsString::from("--analyzer-timeout-secs"),
            OsString::from("soon"),
        ])
    }
}

/// Frames `body` with a `Content-Length` header.
pub fn frame(body: &str) -> Vec<u8> {
    format!("Content-Length: {}\r\n\r\n{body}", body.len()).into_bytes()
}
