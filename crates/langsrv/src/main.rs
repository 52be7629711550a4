//! Entry point for the `langsrv` binary.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use langsrv::{StructuredHealthReporter, SystemConfigLoader, bootstrap_with};

fn main() -> ExitCode {
    let reporter = Arc::new(StructuredHealthReporter::new());
    let server = match bootstrap_with(&SystemConfigLoader, reporter) {
        Ok(server) => server,
        Err(error) => {
            // Telemetry may not be installed yet, so report directly.
            drop(writeln!(io::stderr().lock(), "langsrv: {error}"));
            return ExitCode::FAILURE;
        }
    };

    match server.serve(io::stdin().lock(), io::stdout().lock()) {
        Ok(exit) => ExitCode::from(exit.code()),
        Err(_) => ExitCode::FAILURE,
    }
}
