//! Command handlers.

use std::path::{Path, PathBuf};

use langsrv_protocol::{NotificationMessage, OutgoingMessage, ResponseMessage};
use lsp_types::{MessageType, ShowMessageParams};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::{DISPATCH_TARGET, Dispatcher};
use crate::capabilities;
use crate::collaborator::{AnalysisRequest, CompilerContext};
use crate::command::{Command, DocumentItem, TextRequest};
use crate::documents::OpenDocument;
use crate::errors::HandlerError;
use crate::position;

const SHOW_MESSAGE: &str = "window/showMessage";

/// Builds a `window/showMessage` warning.
pub(super) fn show_warning(message: &str) -> NotificationMessage {
    let params = ShowMessageParams {
        typ: MessageType::WARNING,
        message: message.to_owned(),
    };
    NotificationMessage::new(SHOW_MESSAGE, serde_json::to_value(params).ok())
}

/// Maps a document URI to a filesystem path, keeping non-file URIs verbatim.
fn document_path(uri: &str) -> PathBuf {
    Url::parse(uri)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(uri))
}

impl Dispatcher {
    pub(super) fn handle(&mut self, command: Command) -> Result<Vec<OutgoingMessage>, HandlerError> {
        match command {
            Command::Initialize { id, params } => {
                let result = capabilities::initialize_result(self.analysis.as_ref());
                info!(
                    target: DISPATCH_TARGET,
                    root = ?params.root_uri.as_deref().or(params.root_path.as_deref()),
                    client = ?params.client_info.as_ref().map(|info| info.name.as_str()),
                    "initializing session"
                );
                let value = serde_json::to_value(result)?;
                Ok(vec![ResponseMessage::success(id, value).into()])
            }
            Command::Initialized => {
                debug!(target: DISPATCH_TARGET, "client finished initialisation");
                Ok(Vec::new())
            }
            Command::Shutdown { id } => Ok(vec![ResponseMessage::success(id, Value::Null).into()]),
            Command::Exit => Ok(Vec::new()),
            Command::DidOpenDocument(item) => {
                self.open_document(item);
                Ok(Vec::new())
            }
            Command::DidChangeDocument { uri, version, text } => {
                let document = self.documents.replace(&uri, text)?;
                if let Some(next) = version {
                    document.version = next;
                }
                Ok(Vec::new())
            }
            Command::DidCloseDocument { uri } => {
                self.documents.close(&uri)?;
                debug!(target: DISPATCH_TARGET, %uri, "closed document");
                Ok(Vec::new())
            }
            Command::DidSaveDocument {
                uri,
                text: Some(saved),
            } => {
                self.documents.replace(&uri, saved)?;
                Ok(Vec::new())
            }
            Command::DidSaveDocument { uri, text: None } => {
                self.documents.get(&uri)?;
                Ok(Vec::new())
            }
            Command::CancelRequest { target } => {
                debug!(
                    target: DISPATCH_TARGET,
                    id = %target,
                    "cancellation ignored, requests are answered before the next message is read"
                );
                Ok(Vec::new())
            }
            Command::Text(request) => {
                let id = request.id.clone();
                let result = self.analyze(&request)?;
                Ok(vec![ResponseMessage::success(id, result).into()])
            }
        }
    }

    fn open_document(&mut self, item: DocumentItem) {
        debug!(
            target: DISPATCH_TARGET,
            uri = %item.uri,
            language = %item.language_id,
            bytes = item.text.len(),
            "opened document"
        );
        self.documents.insert(OpenDocument {
            uri: item.uri,
            language_id: item.language_id,
            version: item.version,
            text: item.text,
        });
    }

    fn analyze(&self, request: &TextRequest) -> Result<Value, HandlerError> {
        let document = self.documents.get(&request.uri)?;
        let offset = position::offset_at(&document.text, request.position)
            .map_err(|source| HandlerError::position(&request.uri, source))?;

        if !self.analysis.supports(request.kind) {
            debug!(
                target: DISPATCH_TARGET,
                kind = %request.kind,
                "analysis backend does not support request"
            );
            return Ok(Value::Null);
        }

        let path = document_path(&request.uri);
        let context = self.compiler_context(&path);
        let analysis = AnalysisRequest {
            kind: request.kind,
            path,
            text: document.text.clone(),
            offset,
            context,
        };
        Ok(self.analysis.analyze(&analysis)?)
    }

    fn compiler_context(&self, document: &Path) -> Option<CompilerContext> {
        let resolver = self.resolver.as_ref()?;
        let root = self.session.workspace_root().map_or_else(
            || document.parent().map(Path::to_path_buf).unwrap_or_default(),
            document_path,
        );

        resolver
            .resolve(&root, document)
            .inspect_err(|error| {
                warn!(
                    target: DISPATCH_TARGET,
                    document = %document.display(),
                    %error,
                    "continuing without compiler context"
                );
            })
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("file:///p/Sources/App/a.swift", "/p/Sources/App/a.swift")]
    #[case("file:///p/with%20space.swift", "/p/with space.swift")]
    #[case("untitled:Untitled-1", "untitled:Untitled-1")]
    fn maps_uris_to_paths(#[case] uri: &str, #[case] expected: &str) {
        assert_eq!(document_path(uri), PathBuf::from(expected));
    }

    #[rstest]
    fn warning_carries_message_type() {
        let notification = show_warning("analyzer offline");
        assert_eq!(notification.method, "window/showMessage");
        assert_eq!(
            notification.params,
            Some(serde_json::json!({"type": 2, "message": "analyzer offline"}))
        );
    }
}
