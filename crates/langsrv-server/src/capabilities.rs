//! Capability advertisement for the `initialize` response.

use lsp_types::{
    CompletionOptions, HoverProviderCapability, InitializeResult, OneOf, SaveOptions,
    ServerCapabilities, ServerInfo, SignatureHelpOptions, TextDocumentSyncCapability,
    TextDocumentSyncKind, TextDocumentSyncOptions, TextDocumentSyncSaveOptions,
};

use crate::collaborator::AnalysisBackend;
use crate::command::TextRequestKind;

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "langsrv";

fn characters(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|value| (*value).to_owned()).collect())
}

/// Builds the `initialize` result.
///
/// Document sync is always full-content with open/close and save
/// notifications. Text providers are advertised only for the kinds `backend`
/// supports.
#[must_use]
pub fn initialize_result(backend: &dyn AnalysisBackend) -> InitializeResult {
    let supports = |kind| backend.supports(kind);

    let capabilities = ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(true),
                })),
                ..TextDocumentSyncOptions::default()
            },
        )),
        completion_provider: supports(TextRequestKind::Completion).then(|| CompletionOptions {
            trigger_characters: characters(&["."]),
            ..CompletionOptions::default()
        }),
        hover_provider: supports(TextRequestKind::Hover)
            .then_some(HoverProviderCapability::Simple(true)),
        definition_provider: supports(TextRequestKind::Definition).then_some(OneOf::Left(true)),
        signature_help_provider: supports(TextRequestKind::SignatureHelp).then(|| {
            SignatureHelpOptions {
                trigger_characters: characters(&["(", ","]),
                ..SignatureHelpOptions::default()
            }
        }),
        ..ServerCapabilities::default()
    };

    InitializeResult {
        capabilities,
        server_info: Some(ServerInfo {
            name: SERVER_NAME.to_owned(),
            version: Some(env!("CARGO_PKG_VERSION").to_owned()),
        }),
    }
}
