//! Compiler context lookup from the build system's debug manifest.
//!
//! The manifest holds one compile command per module under
//! `commands."<Module.module>"`, each listing `sources`, `import-paths`, and
//! `other-args`. The owning module of a document is the directory following
//! `Sources/` in its path; files placed directly in `Sources/` belong to the
//! package itself, named after the project root directory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use langsrv_config::Config;
use langsrv_server::{CollaboratorError, CompilerContext, CompilerContextResolver};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const MANIFEST_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::manifest");

const COLLABORATOR: &str = "build manifest";

/// Failures reading the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("cannot read '{path}': {source}")]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The manifest is not valid YAML of the expected shape.
    #[error("cannot parse '{path}': {message}")]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The manifest has no compile command for the module.
    #[error("no compile command for module '{module}' in '{path}'")]
    ModuleMissing {
        /// Module that was looked up.
        module: String,
        /// Manifest path.
        path: PathBuf,
    },

    /// The project root has no usable directory name.
    #[error("cannot derive a package name from '{root}'")]
    UnnamedPackage {
        /// Project root.
        root: PathBuf,
    },
}

impl From<ManifestError> for CollaboratorError {
    fn from(error: ManifestError) -> Self {
        Self::unavailable(COLLABORATOR, error.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
struct BuildManifest {
    #[serde(default)]
    commands: BTreeMap<String, ModuleCommand>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ModuleCommand {
    #[serde(default)]
    sources: Vec<PathBuf>,
    #[serde(default)]
    import_paths: Vec<PathBuf>,
    #[serde(default)]
    other_args: Vec<String>,
}

/// Resolves compiler contexts from a `debug.yaml` build manifest.
#[derive(Debug, Clone)]
pub struct BuildManifestResolver {
    manifest: Utf8PathBuf,
}

impl BuildManifestResolver {
    /// Creates a resolver reading `manifest`, relative to the project root
    /// unless absolute.
    #[must_use]
    pub fn new(manifest: impl Into<Utf8PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
        }
    }

    /// Creates a resolver for the configured manifest path.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.build_manifest())
    }

    /// Manifest path as configured.
    #[must_use]
    pub fn manifest(&self) -> &Utf8Path {
        &self.manifest
    }

    fn manifest_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(self.manifest.as_std_path())
    }

    fn load(path: &Path) -> Result<BuildManifest, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_saphyr::from_str(&text).map_err(|error| ManifestError::Parse {
            path: path.to_path_buf(),
            message: error.to_string(),
        })
    }

    /// Resolves the context, reporting manifest failures in detail.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] when the manifest cannot be read or parsed,
    /// or has no command for the owning module.
    pub fn context_for(
        &self,
        project_root: &Path,
        document: &Path,
    ) -> Result<CompilerContext, ManifestError> {
        let module = owning_module(project_root, document)?;
        let path = self.manifest_path(project_root);
        let mut manifest = Self::load(&path)?;
        let command = manifest
            .commands
            .remove(&format!("<{module}.module>"))
            .ok_or_else(|| ManifestError::ModuleMissing {
                module: module.clone(),
                path: path.clone(),
            })?;

        debug!(
            target: MANIFEST_TARGET,
            %module,
            manifest = %path.display(),
            sources = command.sources.len(),
            "resolved compiler context"
        );
        Ok(CompilerContext {
            module,
            sources: command.sources,
            import_paths: command.import_paths,
            extra_args: command.other_args,
        })
    }
}

impl CompilerContextResolver for BuildManifestResolver {
    fn resolve(
        &self,
        project_root: &Path,
        document: &Path,
    ) -> Result<CompilerContext, CollaboratorError> {
        Ok(self.context_for(project_root, document)?)
    }
}

/// Name of the module that owns `document`.
///
/// # Errors
///
/// Returns [`ManifestError::UnnamedPackage`] when the document belongs to the
/// package and the project root has no directory name.
pub fn owning_module(project_root: &Path, document: &Path) -> Result<String, ManifestError> {
    let components: Vec<&str> = document
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    let module_dir = components
        .iter()
        .position(|component| *component == "Sources")
        .and_then(|index| {
            let rest = components.get(index + 1..)?;
            // A single remaining component is the file itself.
            match rest {
                [directory, _, ..] => Some((*directory).to_owned()),
                _ => None,
            }
        });

    module_dir.map_or_else(|| package_name(project_root), Ok)
}

fn package_name(project_root: &Path) -> Result<String, ManifestError> {
    project_root
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| ManifestError::UnnamedPackage {
            root: project_root.to_path_buf(),
        })
}
