//! Method routing from envelopes to typed commands.
//!
//! The registry is a table from method name to parameter decoder. A decoder
//! is registered either for requests or for notifications; a message of the
//! wrong kind is rejected instead of being decoded.

mod decoders;

use std::collections::HashMap;

use langsrv_protocol::{Envelope, RequestId, ResponseEnvelope};
use serde_json::Value;
use tracing::debug;

use crate::command::Command;
use crate::errors::DispatchError;

/// Tracing target for method routing.
const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Decodes request parameters into a command.
pub type RequestDecoder = fn(RequestId, Option<Value>) -> Result<Command, String>;

/// Decodes notification parameters into a command.
pub type NotificationDecoder = fn(Option<Value>) -> Result<Command, String>;

/// A registered parameter decoder.
#[derive(Debug, Clone, Copy)]
pub enum Decoder {
    /// The method is a request and expects an answer.
    Request(RequestDecoder),
    /// The method is a notification and is never answered.
    Notification(NotificationDecoder),
}

impl Decoder {
    const fn kind(self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Notification(_) => "notification",
        }
    }
}

/// What an envelope resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// A command to execute.
    Command(Command),
    /// A notification for a method the server does not handle.
    Ignored {
        /// Method named by the notification.
        method: String,
    },
    /// A response from the client to a server-initiated request.
    ClientResponse(ResponseEnvelope),
}

/// Table of known methods.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    decoders: HashMap<String, Decoder>,
}

impl CommandRegistry {
    /// Creates a registry without any methods.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry holding the lifecycle, document, and text methods.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("initialize", Decoder::Request(decoders::initialize));
        registry.register("initialized", Decoder::Notification(decoders::initialized));
        registry.register("shutdown", Decoder::Request(decoders::shutdown));
        registry.register("exit", Decoder::Notification(decoders::exit));
        registry.register(
            "textDocument/didOpen",
            Decoder::Notification(decoders::did_open),
        );
        registry.register(
            "textDocument/didChange",
            Decoder::Notification(decoders::did_change),
        );
        registry.register(
            "textDocument/didClose",
            Decoder::Notification(decoders::did_close),
        );
        registry.register(
            "textDocument/didSave",
            Decoder::Notification(decoders::did_save),
        );
        registry.register(
            "$/cancelRequest",
            Decoder::Notification(decoders::cancel_request),
        );
        registry.register(
            "textDocument/completion",
            Decoder::Request(decoders::completion),
        );
        registry.register("textDocument/hover", Decoder::Request(decoders::hover));
        registry.register(
            "textDocument/definition",
            Decoder::Request(decoders::definition),
        );
        registry.register(
            "textDocument/signatureHelp",
            Decoder::Request(decoders::signature_help),
        );
        registry
    }

    /// Registers `decoder` for `method`, returning any decoder it replaces.
    pub fn register(&mut self, method: impl Into<String>, decoder: Decoder) -> Option<Decoder> {
        self.decoders.insert(method.into(), decoder)
    }

    /// Returns `true` when `method` has a decoder.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.decoders.contains_key(method)
    }

    /// Resolves an envelope into a command.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownMethod`] for requests naming an
    /// unregistered method, [`DispatchError::KindMismatch`] when the message
    /// kind disagrees with the registration, and
    /// [`DispatchError::InvalidParams`] when decoding fails.
    pub fn resolve(&self, envelope: Envelope) -> Result<Resolution, DispatchError> {
        match envelope {
            Envelope::Request(request) => match self.decoders.get(&request.method) {
                None => Err(DispatchError::UnknownMethod {
                    method: request.method,
                    id: request.id,
                }),
                Some(Decoder::Request(decode)) => decode(request.id.clone(), request.params)
                    .map(Resolution::Command)
                    .map_err(|reason| DispatchError::InvalidParams {
                        method: request.method,
                        reason,
                        id: Some(request.id),
                    }),
                Some(decoder @ Decoder::Notification(_)) => Err(DispatchError::KindMismatch {
                    method: request.method,
                    expected: decoder.kind(),
                    id: Some(request.id),
                }),
            },
            Envelope::Notification(notification) => {
                match self.decoders.get(&notification.method) {
                    None => {
                        if !notification.method.starts_with("$/") {
                            debug!(
                                target: REGISTRY_TARGET,
                                method = %notification.method,
                                "no decoder registered for notification"
                            );
                        }
                        Ok(Resolution::Ignored {
                            method: notification.method,
                        })
                    }
                    Some(Decoder::Notification(decode)) => decode(notification.params)
                        .map(Resolution::Command)
                        .map_err(|reason| DispatchError::InvalidParams {
                            method: notification.method,
                            reason,
                            id: None,
                        }),
                    Some(decoder @ Decoder::Request(_)) => Err(DispatchError::KindMismatch {
                        method: notification.method,
                        expected: decoder.kind(),
                        id: None,
                    }),
                }
            }
            Envelope::Response(response) => Ok(Resolution::ClientResponse(response)),
        }
    }
}
