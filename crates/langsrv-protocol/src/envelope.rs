//! Classification of message bodies into JSON-RPC envelopes.

use std::fmt;

use langsrv_config::VersionPolicy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::JSONRPC_VERSION;
use crate::error::EnvelopeError;
use crate::message::{ResponseError, ResponsePayload};

/// Identifier correlating a request with its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer identifier.
    Number(i64),
    /// String identifier.
    String(String),
}

impl RequestId {
    fn from_value(value: &Value) -> Result<Self, EnvelopeError> {
        match value {
            Value::Number(number) => number
                .as_i64()
                .map(Self::Number)
                .ok_or(EnvelopeError::InvalidRequestId { found: "non-integer number" }),
            Value::String(text) => Ok(Self::String(text.clone())),
            other => Err(EnvelopeError::InvalidRequestId {
                found: json_kind(other),
            }),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(formatter, "{number}"),
            Self::String(text) => write!(formatter, "\"{text}\""),
        }
    }
}

/// A method call expecting a response.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    /// Correlation id.
    pub id: RequestId,
    /// Method name.
    pub method: String,
    /// Raw parameters, if any.
    pub params: Option<Value>,
}

/// A method call without a response.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEnvelope {
    /// Method name.
    pub method: String,
    /// Raw parameters, if any.
    pub params: Option<Value>,
}

/// A reply sent by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    /// Id of the request being answered; `None` when the peer sent `null`.
    pub id: Option<RequestId>,
    /// Result or error.
    pub payload: ResponsePayload,
}

/// A classified JSON-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Request carrying an id.
    Request(RequestEnvelope),
    /// Notification without an id.
    Notification(NotificationEnvelope),
    /// Response to an earlier server request.
    Response(ResponseEnvelope),
}

impl Envelope {
    /// Method name, for requests and notifications.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(request) => Some(&request.method),
            Self::Notification(notification) => Some(&notification.method),
            Self::Response(_) => None,
        }
    }
}

/// Parses message bodies into [`Envelope`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeParser {
    policy: VersionPolicy,
}

impl EnvelopeParser {
    /// Creates a parser applying `policy` to bodies without a `jsonrpc` field.
    #[must_use]
    pub const fn new(policy: VersionPolicy) -> Self {
        Self { policy }
    }

    /// Classifies a message body.
    ///
    /// # Errors
    ///
    /// Returns an [`EnvelopeError`] when the body is not a JSON object, carries
    /// the wrong protocol version, or matches no envelope shape. Errors on
    /// request-shaped bodies expose the request id via
    /// [`EnvelopeError::request_id`].
    pub fn parse(&self, body: &str) -> Result<Envelope, EnvelopeError> {
        let value: Value =
            serde_json::from_str(body).map_err(|source| EnvelopeError::InvalidJson { source })?;
        let mut object = match value {
            Value::Object(object) => object,
            other => {
                return Err(EnvelopeError::NotAnObject {
                    found: json_kind(&other),
                });
            }
        };

        let raw_id = object.remove("id");
        let reply_id = match (&raw_id, object.contains_key("method")) {
            (Some(id), true) => RequestId::from_value(id).ok(),
            _ => None,
        };

        self.check_version(&object, reply_id.as_ref())?;

        match object.remove("method") {
            Some(Value::String(method)) => {
                let params = take_params(&mut object, reply_id.as_ref())?;
                match raw_id {
                    None => Ok(Envelope::Notification(NotificationEnvelope {
                        method,
                        params,
                    })),
                    Some(id) => Ok(Envelope::Request(RequestEnvelope {
                        id: RequestId::from_value(&id)?,
                        method,
                        params,
                    })),
                }
            }
            Some(other) => Err(EnvelopeError::malformed(
                format!("method must be a string, found {}", json_kind(&other)),
                reply_id,
            )),
            None => parse_response(&mut object, raw_id),
        }
    }

    fn check_version(
        &self,
        object: &Map<String, Value>,
        id: Option<&RequestId>,
    ) -> Result<(), EnvelopeError> {
        match object.get("jsonrpc") {
            Some(Value::String(version)) if version == JSONRPC_VERSION => Ok(()),
            Some(other) => Err(EnvelopeError::UnsupportedVersion {
                found: other.to_string(),
                id: id.cloned(),
            }),
            None if self.policy.requires_version() => {
                Err(EnvelopeError::MissingVersion { id: id.cloned() })
            }
            None => Ok(()),
        }
    }
}

fn take_params(
    object: &mut Map<String, Value>,
    id: Option<&RequestId>,
) -> Result<Option<Value>, EnvelopeError> {
    match object.remove("params") {
        None | Some(Value::Null) => Ok(None),
        Some(params @ (Value::Object(_) | Value::Array(_))) => Ok(Some(params)),
        Some(other) => Err(EnvelopeError::malformed(
            format!("params must be an object or array, found {}", json_kind(&other)),
            id.cloned(),
        )),
    }
}

fn parse_response(
    object: &mut Map<String, Value>,
    raw_id: Option<Value>,
) -> Result<Envelope, EnvelopeError> {
    let id = match raw_id {
        None | Some(Value::Null) => None,
        Some(value) => Some(RequestId::from_value(&value)?),
    };

    let payload = match (object.remove("result"), object.remove("error")) {
        (Some(result), None) => ResponsePayload::Result(result),
        (None, Some(raw_error)) => {
            let error: ResponseError = serde_json::from_value(raw_error).map_err(|source| {
                EnvelopeError::malformed(format!("invalid error object: {source}"), None)
            })?;
            ResponsePayload::Error(error)
        }
        (Some(_), Some(_)) => {
            return Err(EnvelopeError::malformed(
                "response carries both result and error",
                None,
            ));
        }
        (None, None) => {
            return Err(EnvelopeError::malformed(
                "expected a method, a result, or an error",
                None,
            ));
        }
    };

    Ok(Envelope::Response(ResponseEnvelope { id, payload }))
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
