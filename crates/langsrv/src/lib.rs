//! Process wiring for the `langsrv` language server.
//!
//! The binary loads [`langsrv_config::Config`], installs structured telemetry
//! on stderr, and then serves framed JSON-RPC over stdin and stdout until the
//! client sends `exit` or closes the stream. Analysis is delegated to an
//! external command when `analyzer_command` is configured; compiler
//! arguments come from the build manifest under the workspace root.
//!
//! Stdout carries protocol traffic only. Everything diagnostic goes through
//! `tracing` to stderr, and lifecycle milestones are surfaced through a
//! [`HealthReporter`].

mod bootstrap;
mod health;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, LanguageServer, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with, without_client_flags,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
