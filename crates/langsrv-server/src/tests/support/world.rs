//! Scenario world driving a dispatcher with JSON-RPC bodies.

use langsrv_config::VersionPolicy;
use rstest::fixture;
use serde_json::{Value, json};

use crate::{Dispatcher, Lifecycle, Reply, SessionExit};

/// Dispatcher plus everything it has answered so far.
pub struct SessionWorld {
    dispatcher: Dispatcher,
    replies: Vec<Reply>,
    exit: Option<SessionExit>,
}

impl SessionWorld {
    fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(VersionPolicy::Lenient),
            replies: Vec::new(),
            exit: None,
        }
    }

    /// Sends one body and records the reply.
    pub fn send(&mut self, body: &Value) {
        let reply = self.dispatcher.handle_body(&body.to_string());
        if reply.exit.is_some() {
            self.exit = reply.exit;
        }
        self.replies.push(reply);
    }

    /// Sends a request.
    pub fn request(&mut self, id: i64, method: &str, params: Value) {
        self.send(&json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}));
    }

    /// Sends a notification.
    pub fn notify(&mut self, method: &str, params: Value) {
        self.send(&json!({"jsonrpc": "2.0", "method": method, "params": params}));
    }

    /// Runs `initialize` and `initialized`.
    pub fn initialize(&mut self, id: i64) {
        self.request(id, "initialize", json!({"rootUri": "file:///p"}));
        self.notify("initialized", json!({}));
    }

    /// Requests hover at the start of `uri`.
    pub fn hover(&mut self, id: i64, uri: &str) {
        self.request(
            id,
            "textDocument/hover",
            json!({"textDocument": {"uri": uri}, "position": {"line": 0, "character": 0}}),
        );
    }

    /// Finds the response answering `id`.
    pub fn response(&self, id: i64) -> Value {
        self.replies
            .iter()
            .flat_map(|reply| reply.messages.iter())
            .filter_map(|message| message.to_body().ok())
            .filter_map(|body| serde_json::from_str::<Value>(&body).ok())
            .find(|body| body.get("id") == Some(&json!(id)))
            .unwrap_or_else(|| panic!("no response for id {id}: {:?}", self.replies))
    }

    /// Whether the latest body produced no output.
    pub fn last_reply_was_silent(&self) -> bool {
        self.replies
            .last()
            .is_some_and(|reply| reply.messages.is_empty())
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.dispatcher.session().lifecycle()
    }

    /// Session outcome once `exit` has been handled.
    pub const fn exit(&self) -> Option<SessionExit> {
        self.exit
    }

    /// Cached text of `uri`, if it is open.
    pub fn document_text(&self, uri: &str) -> Option<String> {
        self.dispatcher.documents().text(uri).ok().map(str::to_owned)
    }
}

/// Fresh world awaiting `initialize`.
#[fixture]
pub fn world() -> SessionWorld {
    SessionWorld::new()
}
