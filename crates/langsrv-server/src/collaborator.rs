//! Seams to the external analysis backend and build introspection.
//!
//! The dispatcher only ever talks to these traits. Concrete implementations
//! live in `langsrv-backend`; tests substitute doubles.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::command::TextRequestKind;

/// Compiler arguments and module membership for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompilerContext {
    /// Module that owns the document.
    pub module: String,
    /// Every source file of the module.
    pub sources: Vec<PathBuf>,
    /// Import search paths.
    pub import_paths: Vec<PathBuf>,
    /// Remaining compiler flags, in order.
    pub extra_args: Vec<String>,
}

impl CompilerContext {
    /// Flattens the context into a compiler argument vector.
    ///
    /// Sources come first, followed by the module name, the extra flags, and
    /// one `-I` pair per import path.
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        let mut arguments: Vec<String> = self
            .sources
            .iter()
            .map(|source| source.display().to_string())
            .collect();
        arguments.push(String::from("-module-name"));
        arguments.push(self.module.clone());
        arguments.extend(self.extra_args.iter().cloned());
        for path in &self.import_paths {
            arguments.push(String::from("-I"));
            arguments.push(path.display().to_string());
        }
        arguments
    }
}

/// Failure of an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The collaborator could not be reached or set up.
    #[error("{collaborator} is unavailable: {reason}")]
    Unavailable {
        /// Collaborator name.
        collaborator: String,
        /// Why it could not be used.
        reason: String,
    },

    /// The collaborator did not answer in time.
    #[error("{collaborator} timed out after {timeout_secs}s")]
    Timeout {
        /// Collaborator name.
        collaborator: String,
        /// Timeout that elapsed.
        timeout_secs: u64,
    },

    /// The collaborator answered with a failure.
    #[error("{collaborator} failed: {message}")]
    Failed {
        /// Collaborator name.
        collaborator: String,
        /// Failure reported by the collaborator.
        message: String,
    },
}

impl CollaboratorError {
    /// Builds an [`CollaboratorError::Unavailable`] error.
    #[must_use]
    pub fn unavailable(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }

    /// Builds a [`CollaboratorError::Timeout`] error.
    #[must_use]
    pub fn timeout(collaborator: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            collaborator: collaborator.into(),
            timeout_secs,
        }
    }

    /// Builds a [`CollaboratorError::Failed`] error.
    #[must_use]
    pub fn failed(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }
}

/// Derives compiler arguments for a document.
pub trait CompilerContextResolver {
    /// Resolves the context of `document` inside `project_root`.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when build information is missing or
    /// unreadable.
    fn resolve(
        &self,
        project_root: &Path,
        document: &Path,
    ) -> Result<CompilerContext, CollaboratorError>;
}

/// Everything the analysis backend needs for one text request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    /// Requested analysis.
    pub kind: TextRequestKind,
    /// Filesystem path of the document.
    pub path: PathBuf,
    /// Current document text.
    pub text: String,
    /// UTF-8 byte offset of the cursor.
    pub offset: usize,
    /// Compiler context, when one could be resolved.
    pub context: Option<CompilerContext>,
}

/// Computes completions, hovers, definitions, and signature help.
pub trait AnalysisBackend {
    /// Returns `true` when the backend can answer `kind`.
    fn supports(&self, kind: TextRequestKind) -> bool;

    /// Runs one analysis and returns the protocol result value.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the backend cannot answer.
    fn analyze(&self, request: &AnalysisRequest) -> Result<Value, CollaboratorError>;
}

/// Backend used when no analyzer is configured. It supports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAnalysis;

impl AnalysisBackend for DisabledAnalysis {
    fn supports(&self, _kind: TextRequestKind) -> bool {
        false
    }

    fn analyze(&self, request: &AnalysisRequest) -> Result<Value, CollaboratorError> {
        Err(CollaboratorError::unavailable(
            "analysis",
            format!("no analyzer configured for {}", request.kind),
        ))
    }
}
