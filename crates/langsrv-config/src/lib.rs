//! Shared configuration for the `langsrv` language server.
//!
//! [`Config`] is assembled by `ortho_config` from built-in defaults, an
//! optional TOML file (`--config-path` or `LANGSRV_CONFIG_PATH`), `LANGSRV_*`
//! environment variables, and command-line flags, in increasing order of
//! precedence.

mod defaults;
mod diagnostics;
mod protocol;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_ANALYZER_TIMEOUT_SECS, DEFAULT_BUILD_MANIFEST, DEFAULT_LOG_FILTER,
    default_build_manifest, default_log_filter, default_log_filter_string, default_log_format,
    default_version_policy,
};
pub use diagnostics::{LogFormat, LogFormatParseError};
pub use protocol::{VersionPolicy, VersionPolicyParseError};

/// Runtime configuration for the language server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "LANGSRV")]
pub struct Config {
    /// Tracing filter expression, e.g. `info` or `langsrv_server=debug`.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for diagnostics written to stderr.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Handling of envelopes that omit the `jsonrpc` field.
    #[ortho_config(default = defaults::default_version_policy())]
    pub jsonrpc_version: VersionPolicy,
    /// Executable answering analysis requests. Analysis is disabled when unset.
    pub analyzer_command: Option<String>,
    /// Extra arguments passed to the analyzer executable.
    #[ortho_config(default = Vec::new())]
    pub analyzer_args: Vec<String>,
    /// Seconds an analyzer invocation may run before it is killed.
    #[ortho_config(default = defaults::DEFAULT_ANALYZER_TIMEOUT_SECS)]
    pub analyzer_timeout_secs: u64,
    /// Build manifest path, resolved against the workspace root when relative.
    #[ortho_config(default = defaults::default_build_manifest())]
    pub build_manifest: Utf8PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            jsonrpc_version: default_version_policy(),
            analyzer_command: None,
            analyzer_args: Vec::new(),
            analyzer_timeout_secs: DEFAULT_ANALYZER_TIMEOUT_SECS,
            build_manifest: default_build_manifest(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Diagnostic output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Policy applied to envelopes without a `jsonrpc` field.
    #[must_use]
    pub const fn version_policy(&self) -> VersionPolicy {
        self.jsonrpc_version
    }

    /// Analyzer executable, when one is configured.
    #[must_use]
    pub fn analyzer_command(&self) -> Option<&str> {
        self.analyzer_command.as_deref()
    }

    /// Extra analyzer arguments.
    #[must_use]
    pub fn analyzer_args(&self) -> &[String] {
        &self.analyzer_args
    }

    /// Analyzer timeout as a [`Duration`].
    #[must_use]
    pub const fn analyzer_timeout(&self) -> Duration {
        Duration::from_secs(self.analyzer_timeout_secs)
    }

    /// Build manifest path as configured.
    #[must_use]
    pub fn build_manifest(&self) -> &Utf8Path {
        &self.build_manifest
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn default_config_matches_published_defaults() {
        let config = Config::default();
        assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
        assert_eq!(config.log_format(), LogFormat::Json);
        assert_eq!(config.version_policy(), VersionPolicy::Lenient);
        assert!(config.analyzer_command().is_none());
        assert_eq!(config.analyzer_timeout(), Duration::from_secs(30));
        assert_eq!(config.build_manifest(), Utf8Path::new(".build/debug.yaml"));
    }
}
