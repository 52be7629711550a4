//! Error types surfaced while dispatching commands.
//!
//! Each type knows the JSON-RPC error code it is reported with, so the
//! dispatcher can answer a failed request without inspecting variants.

use std::io;

use langsrv_protocol::{ErrorCode, RequestId, ResponseError};
use thiserror::Error;

use crate::collaborator::CollaboratorError;
use crate::documents::DocumentNotOpen;
use crate::position::PositionError;
use crate::session::Lifecycle;

/// Failures turning an envelope into a [`crate::Command`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No decoder is registered for the requested method.
    #[error("method '{method}' is not supported")]
    UnknownMethod {
        /// Method named by the request.
        method: String,
        /// Request to answer.
        id: RequestId,
    },

    /// The parameters did not decode.
    #[error("invalid params for '{method}': {reason}")]
    InvalidParams {
        /// Method being decoded.
        method: String,
        /// Field-specific reason.
        reason: String,
        /// Request to answer; `None` for notifications.
        id: Option<RequestId>,
    },

    /// A notification method arrived as a request or the reverse.
    #[error("'{method}' must be sent as a {expected}")]
    KindMismatch {
        /// Method named by the message.
        method: String,
        /// Message kind the method is registered as.
        expected: &'static str,
        /// Request to answer; `None` for notifications.
        id: Option<RequestId>,
    },
}

impl DispatchError {
    /// Request to answer with an error response, if any.
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::UnknownMethod { id, .. } => Some(id),
            Self::InvalidParams { id, .. } | Self::KindMismatch { id, .. } => id.as_ref(),
        }
    }

    /// Error code reported to the client.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnknownMethod { .. } => ErrorCode::MethodNotFound,
            Self::InvalidParams { .. } => ErrorCode::InvalidParams,
            Self::KindMismatch { .. } => ErrorCode::InvalidRequest,
        }
    }

    /// Error object for the response.
    #[must_use]
    pub fn to_response_error(&self) -> ResponseError {
        ResponseError::new(self.error_code(), self.to_string())
    }
}

/// A command that the session is not in a state to accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Anything other than `initialize` or `exit` before initialisation.
    #[error("server not initialized: '{method}' requires a prior 'initialize'")]
    ServerNotInitialized {
        /// Rejected method.
        method: &'static str,
    },

    /// A command that is illegal in the current state.
    #[error("'{method}' is not allowed while the session is {state}")]
    InvalidTransition {
        /// Rejected method.
        method: &'static str,
        /// State at the time of rejection.
        state: Lifecycle,
    },
}

impl LifecycleError {
    /// Error code reported to the client.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ServerNotInitialized { .. } => ErrorCode::ServerNotInitialized,
            Self::InvalidTransition { .. } => ErrorCode::InvalidRequest,
        }
    }

    /// Error object for the response.
    #[must_use]
    pub fn to_response_error(&self) -> ResponseError {
        ResponseError::new(self.error_code(), self.to_string())
    }
}

/// Failures while executing an admitted command.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The analysis backend or build introspection could not answer.
    #[error("collaborator unavailable: {source}")]
    CollaboratorUnavailable {
        /// Underlying collaborator failure.
        #[source]
        source: CollaboratorError,
    },

    /// The command referenced a document that is not open.
    #[error(transparent)]
    DocumentNotOpen(#[from] DocumentNotOpen),

    /// The position does not exist in the document.
    #[error("position outside '{uri}': {source}")]
    PositionOutOfRange {
        /// Document URI.
        uri: String,
        /// Conversion failure.
        #[source]
        source: PositionError,
    },

    /// A result could not be serialised.
    #[error("failed to serialise result: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl HandlerError {
    pub(crate) fn position(uri: impl Into<String>, source: PositionError) -> Self {
        Self::PositionOutOfRange {
            uri: uri.into(),
            source,
        }
    }

    /// Error code reported to the client.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::CollaboratorUnavailable { .. } => ErrorCode::UnknownErrorCode,
            Self::DocumentNotOpen(_) | Self::PositionOutOfRange { .. } => ErrorCode::InvalidParams,
            Self::Serialize(_) => ErrorCode::InternalError,
        }
    }

    /// Error object for the response.
    #[must_use]
    pub fn to_response_error(&self) -> ResponseError {
        ResponseError::new(self.error_code(), self.to_string())
    }
}

impl From<CollaboratorError> for HandlerError {
    fn from(source: CollaboratorError) -> Self {
        Self::CollaboratorUnavailable { source }
    }
}

/// Fatal failures of the serving loop.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Reading from the byte source failed.
    #[error("failed to read input: {0}")]
    Read(#[source] io::Error),

    /// Writing to the byte sink failed.
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),

    /// An outgoing message could not be serialised.
    #[error("failed to serialise outgoing message: {0}")]
    Serialize(#[from] serde_json::Error),
}
