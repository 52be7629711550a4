//! Parameter decoders for the built-in methods.
//!
//! Decoders are pure: they read the raw params, default what the protocol
//! lets clients omit, and name the offending field on failure.

use langsrv_protocol::RequestId;
use lsp_types::Position;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::command::{Command, DocumentItem, InitializeParams, TextRequest, TextRequestKind};

fn from_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    let value = params.unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::from_value(value).map_err(|error| error.to_string())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentIdentifier {
    uri: String,
    #[serde(default)]
    version: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenedDocument {
    uri: String,
    #[serde(default)]
    language_id: String,
    #[serde(default)]
    version: i32,
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidOpenParams {
    text_document: OpenedDocument,
}

#[derive(Deserialize)]
struct ContentChange {
    text: String,
    #[serde(default)]
    range: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidChangeParams {
    text_document: DocumentIdentifier,
    content_changes: Vec<ContentChange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentParams {
    text_document: DocumentIdentifier,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionParams {
    text_document: DocumentIdentifier,
    position: Position,
}

#[derive(Deserialize)]
struct CancelParams {
    id: RequestId,
}

pub(super) fn initialize(id: RequestId, params: Option<Value>) -> Result<Command, String> {
    let decoded: InitializeParams = from_params(params)?;
    Ok(Command::Initialize {
        id,
        params: decoded,
    })
}

pub(super) fn shutdown(id: RequestId, _params: Option<Value>) -> Result<Command, String> {
    Ok(Command::Shutdown { id })
}

pub(super) fn initialized(_params: Option<Value>) -> Result<Command, String> {
    Ok(Command::Initialized)
}

pub(super) fn exit(_params: Option<Value>) -> Result<Command, String> {
    Ok(Command::Exit)
}

pub(super) fn did_open(params: Option<Value>) -> Result<Command, String> {
    let DidOpenParams { text_document } = from_params(params)?;
    Ok(Command::DidOpenDocument(DocumentItem {
        uri: text_document.uri,
        language_id: text_document.language_id,
        version: text_document.version,
        text: text_document.text,
    }))
}

pub(super) fn did_change(params: Option<Value>) -> Result<Command, String> {
    let DidChangeParams {
        text_document,
        content_changes,
    } = from_params(params)?;

    if content_changes.iter().any(|change| change.range.is_some()) {
        return Err(String::from(
            "contentChanges: ranged edits are not supported, send the full text",
        ));
    }
    let latest = content_changes
        .into_iter()
        .last()
        .ok_or_else(|| String::from("contentChanges: at least one change is required"))?;

    Ok(Command::DidChangeDocument {
        uri: text_document.uri,
        version: text_document.version,
        text: latest.text,
    })
}

pub(super) fn did_close(params: Option<Value>) -> Result<Command, String> {
    let DocumentParams { text_document, .. } = from_params(params)?;
    Ok(Command::DidCloseDocument {
        uri: text_document.uri,
    })
}

pub(super) fn did_save(params: Option<Value>) -> Result<Command, String> {
    let DocumentParams {
        text_document,
        text,
    } = from_params(params)?;
    Ok(Command::DidSaveDocument {
        uri: text_document.uri,
        text,
    })
}

pub(super) fn cancel_request(params: Option<Value>) -> Result<Command, String> {
    let CancelParams { id } = from_params(params)?;
    Ok(Command::CancelRequest { target: id })
}

fn text_request(
    kind: TextRequestKind,
    id: RequestId,
    params: Option<Value>,
) -> Result<Command, String> {
    let PositionParams {
        text_document,
        position,
    } = from_params(params)?;
    Ok(Command::Text(TextRequest {
        id,
        kind,
        uri: text_document.uri,
        position,
    }))
}

pub(super) fn completion(id: RequestId, params: Option<Value>) -> Result<Command, String> {
    text_request(TextRequestKind::Completion, id, params)
}

pub(super) fn hover(id: RequestId, params: Option<Value>) -> Result<Command, String> {
    text_request(TextRequestKind::Hover, id, params)
}

pub(super) fn definition(id: RequestId, params: Option<Value>) -> Result<Command, String> {
    text_request(TextRequestKind::Definition, id, params)
}

pub(super) fn signature_help(id: RequestId, params: Option<Value>) -> Result<Command, String> {
    text_request(TextRequestKind::SignatureHelp, id, params)
}
