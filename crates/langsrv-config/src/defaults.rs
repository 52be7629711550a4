use camino::Utf8PathBuf;

use crate::diagnostics::LogFormat;
use crate::protocol::VersionPolicy;

/// Default log filter expression used by the server binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Seconds an analyzer invocation may run before it is killed.
pub const DEFAULT_ANALYZER_TIMEOUT_SECS: u64 = 30;

/// Build manifest consulted for compiler arguments, relative to the workspace root.
pub const DEFAULT_BUILD_MANIFEST: &str = ".build/debug.yaml";

/// Default log filter expression used by the server binary.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the server binary.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default handling of envelopes that omit the `jsonrpc` field.
#[must_use]
pub fn default_version_policy() -> VersionPolicy {
    VersionPolicy::Lenient
}

/// Default build manifest location.
#[must_use]
pub fn default_build_manifest() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_BUILD_MANIFEST)
}
