//! Typed commands produced from incoming envelopes.

use langsrv_protocol::RequestId;
use lsp_types::Position;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

/// Parameters of the `initialize` request that the server keeps.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Process id of the client, when it reported one.
    pub process_id: Option<u32>,
    /// Workspace root as a URI.
    pub root_uri: Option<String>,
    /// Workspace root as a path, sent by older clients.
    pub root_path: Option<String>,
    /// Client name and version.
    pub client_info: Option<ClientInfo>,
    /// Client-specific options, passed through untouched.
    pub initialization_options: Option<Value>,
    /// Requested trace level.
    pub trace: Option<String>,
}

/// Client identification sent with `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: Option<String>,
}

/// A document as announced by `textDocument/didOpen`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentItem {
    /// Document URI.
    pub uri: String,
    /// Language identifier, empty when the client omitted it.
    pub language_id: String,
    /// Client-side version number.
    pub version: i32,
    /// Full document text.
    pub text: String,
}

/// Text requests answered by the analysis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TextRequestKind {
    /// `textDocument/completion`.
    Completion,
    /// `textDocument/hover`.
    Hover,
    /// `textDocument/definition`.
    Definition,
    /// `textDocument/signatureHelp`.
    SignatureHelp,
}

impl TextRequestKind {
    /// Every kind, in advertisement order.
    pub const ALL: [Self; 4] = [
        Self::Completion,
        Self::Hover,
        Self::Definition,
        Self::SignatureHelp,
    ];

    /// Protocol method carrying this kind.
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Self::Completion => "textDocument/completion",
            Self::Hover => "textDocument/hover",
            Self::Definition => "textDocument/definition",
            Self::SignatureHelp => "textDocument/signatureHelp",
        }
    }
}

/// A position-bearing request against an open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    /// Correlation id.
    pub id: RequestId,
    /// Which analysis is wanted.
    pub kind: TextRequestKind,
    /// Document URI.
    pub uri: String,
    /// Cursor position in protocol coordinates.
    pub position: Position,
}

/// Every message the server understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `initialize` request.
    Initialize {
        /// Correlation id.
        id: RequestId,
        /// Client parameters.
        params: InitializeParams,
    },
    /// `initialized` notification.
    Initialized,
    /// `shutdown` request.
    Shutdown {
        /// Correlation id.
        id: RequestId,
    },
    /// `exit` notification.
    Exit,
    /// `textDocument/didOpen` notification.
    DidOpenDocument(DocumentItem),
    /// `textDocument/didChange` notification carrying the full new text.
    DidChangeDocument {
        /// Document URI.
        uri: String,
        /// New client-side version, when supplied.
        version: Option<i32>,
        /// Full replacement text.
        text: String,
    },
    /// `textDocument/didClose` notification.
    DidCloseDocument {
        /// Document URI.
        uri: String,
    },
    /// `textDocument/didSave` notification.
    DidSaveDocument {
        /// Document URI.
        uri: String,
        /// Saved text, when the client includes it.
        text: Option<String>,
    },
    /// `$/cancelRequest` notification.
    CancelRequest {
        /// Id of the request to cancel.
        target: RequestId,
    },
    /// Completion, hover, definition, or signature help.
    Text(TextRequest),
}

impl Command {
    /// Id to answer, for request-shaped commands.
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Initialize { id, .. } | Self::Shutdown { id } => Some(id),
            Self::Text(request) => Some(&request.id),
            Self::Initialized
            | Self::Exit
            | Self::DidOpenDocument(_)
            | Self::DidChangeDocument { .. }
            | Self::DidCloseDocument { .. }
            | Self::DidSaveDocument { .. }
            | Self::CancelRequest { .. } => None,
        }
    }

    /// Protocol method the command was decoded from.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::Initialized => "initialized",
            Self::Shutdown { .. } => "shutdown",
            Self::Exit => "exit",
            Self::DidOpenDocument(_) => "textDocument/didOpen",
            Self::DidChangeDocument { .. } => "textDocument/didChange",
            Self::DidCloseDocument { .. } => "textDocument/didClose",
            Self::DidSaveDocument { .. } => "textDocument/didSave",
            Self::CancelRequest { .. } => "$/cancelRequest",
            Self::Text(request) => request.kind.method(),
        }
    }
}
