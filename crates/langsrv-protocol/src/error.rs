//! Error types for framing and envelope validation.

use std::string::FromUtf8Error;

use thiserror::Error;

use crate::envelope::RequestId;

/// Errors raised while splitting the byte stream into message bodies.
///
/// Each error concerns a single message. The decoder discards the offending
/// bytes and carries on with the next header it can find.
#[derive(Debug, Error)]
pub enum FrameError {
    /// No header terminator was found before the input ended or the header
    /// size limit was reached.
    #[error("header incomplete after {buffered} bytes")]
    HeaderIncomplete {
        /// Bytes that had been buffered for the header.
        buffered: usize,
    },

    /// The header block was terminated but could not be accepted.
    #[error("invalid header: {reason}")]
    HeaderInvalid {
        /// What was wrong with the header.
        reason: String,
    },

    /// The input ended before the announced body length was received.
    #[error("body truncated: expected {expected} bytes, received {received}")]
    BodyIncomplete {
        /// Length announced by `Content-Length`.
        expected: usize,
        /// Bytes available when the input ended.
        received: usize,
    },

    /// The body was not valid UTF-8.
    #[error("message body is not valid UTF-8: {source}")]
    InvalidBody {
        /// Underlying decoding failure.
        #[source]
        source: FromUtf8Error,
    },
}

impl FrameError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::HeaderInvalid {
            reason: reason.into(),
        }
    }
}

/// Errors raised while classifying a message body.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The body is not JSON at all.
    #[error("body is not valid JSON: {source}")]
    InvalidJson {
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// The body is JSON but not an object.
    #[error("body must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The `jsonrpc` field holds something other than `"2.0"`.
    #[error("unsupported jsonrpc version {found}")]
    UnsupportedVersion {
        /// Offending value, rendered as JSON.
        found: String,
        /// Request id, when the body was request-shaped.
        id: Option<RequestId>,
    },

    /// The `jsonrpc` field is absent and the policy requires it.
    #[error("missing jsonrpc version field")]
    MissingVersion {
        /// Request id, when the body was request-shaped.
        id: Option<RequestId>,
    },

    /// The object matches no request, notification, or response shape.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope {
        /// Which part of the shape was wrong.
        reason: String,
        /// Request id, when the body was request-shaped.
        id: Option<RequestId>,
    },

    /// The `id` field is neither an integer nor a string.
    #[error("request id must be an integer or a string, found {found}")]
    InvalidRequestId {
        /// JSON type that was found instead.
        found: &'static str,
    },
}

impl EnvelopeError {
    pub(crate) fn malformed(reason: impl Into<String>, id: Option<RequestId>) -> Self {
        Self::MalformedEnvelope {
            reason: reason.into(),
            id,
        }
    }

    /// Id of the request the error belongs to, when it could be recovered.
    ///
    /// Only request-shaped bodies report an id; the caller answers those with
    /// an error response.
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::UnsupportedVersion { id, .. }
            | Self::MissingVersion { id }
            | Self::MalformedEnvelope { id, .. } => id.as_ref(),
            Self::InvalidJson { .. } | Self::NotAnObject { .. } | Self::InvalidRequestId { .. } => {
                None
            }
        }
    }
}
