//! Messages written by the server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::JSONRPC_VERSION;
use crate::envelope::RequestId;

/// Standard JSON-RPC and language-server error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The body was not valid JSON.
    ParseError,
    /// The body was not a valid request object.
    InvalidRequest,
    /// The method is not registered.
    MethodNotFound,
    /// The parameters did not match the method.
    InvalidParams,
    /// The server failed while handling the request.
    InternalError,
    /// A request arrived before `initialize`.
    ServerNotInitialized,
    /// Reserved for errors without a more specific code.
    UnknownErrorCode,
    /// The client cancelled the request.
    RequestCancelled,
}

impl ErrorCode {
    /// Numeric value sent on the wire.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerNotInitialized => -32002,
            Self::UnknownErrorCode => -32001,
            Self::RequestCancelled => -32800,
        }
    }
}

/// The error object of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseError {
    /// Creates an error object with the given code.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }
}

/// Result or error half of a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponsePayload {
    /// Successful result; `null` is a valid result.
    Result(Value),
    /// Failure description.
    Error(ResponseError),
}

/// A response to a client request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseMessage {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// Id of the request being answered; `null` when it could not be read.
    pub id: Option<RequestId>,
    /// Result or error.
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

impl ResponseMessage {
    /// Builds a successful response.
    #[must_use]
    pub const fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            payload: ResponsePayload::Result(result),
        }
    }

    /// Builds an error response.
    #[must_use]
    pub const fn failure(id: Option<RequestId>, error: ResponseError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            payload: ResponsePayload::Error(error),
        }
    }
}

/// A notification sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationMessage {
    /// Protocol version, always "2.0".
    pub jsonrpc: &'static str,
    /// The method to invoke.
    pub method: String,
    /// Optional parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl NotificationMessage {
    /// Creates a new notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        }
    }
}

/// Anything the server writes to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    /// Reply to a request.
    Response(ResponseMessage),
    /// Server-initiated notification.
    Notification(NotificationMessage),
}

impl OutgoingMessage {
    /// Serialises the message into a body ready for framing.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error raised by `serde_json`.
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Id of the request answered by this message, if it is a response.
    #[must_use]
    pub const fn response_id(&self) -> Option<&RequestId> {
        match self {
            Self::Response(response) => response.id.as_ref(),
            Self::Notification(_) => None,
        }
    }
}

impl From<ResponseMessage> for OutgoingMessage {
    fn from(value: ResponseMessage) -> Self {
        Self::Response(value)
    }
}

impl From<NotificationMessage> for OutgoingMessage {
    fn from(value: NotificationMessage) -> Self {
        Self::Notification(value)
    }
}
