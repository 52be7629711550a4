//! Analysis collaborators for the `langsrv` language server.
//!
//! [`ProcessAnalyzer`] answers text requests by running an external command,
//! and [`BuildManifestResolver`] derives the compiler arguments for a
//! document from the build system's debug manifest. Both plug into the
//! dispatcher through the seams defined in `langsrv-server`.

mod manifest;
mod process;

pub use manifest::{BuildManifestResolver, ManifestError, owning_module};
pub use process::ProcessAnalyzer;
