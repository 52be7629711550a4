//! Unit tests for message handling and the serving loop.

use std::io::Cursor;
use std::path::Path;

use langsrv_config::VersionPolicy;
use mockall::mock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::collaborator::{AnalysisRequest, CollaboratorError, CompilerContext};
use crate::command::TextRequestKind;
use crate::session::Lifecycle;

mock! {
    Analysis {}
    impl AnalysisBackend for Analysis {
        fn supports(&self, kind: TextRequestKind) -> bool;
        fn analyze(&self, request: &AnalysisRequest) -> Result<Value, CollaboratorError>;
    }
}

mock! {
    Resolver {}
    impl CompilerContextResolver for Resolver {
        fn resolve(
            &self,
            project_root: &Path,
            document: &Path,
        ) -> Result<CompilerContext, CollaboratorError>;
    }
}

const INITIALIZE: &str =
    r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"rootUri":"file:///p"}}"#;
const OPEN: &str = r#"{"jsonrpc":"2.0","method":"textDocument/didOpen","params":{"textDocument":{"uri":"file:///p/Sources/App/a.swift","languageId":"swift","version":1,"text":"ab\ncd"}}}"#;
const HOVER: &str = r#"{"jsonrpc":"2.0","id":7,"method":"textDocument/hover","params":{"textDocument":{"uri":"file:///p/Sources/App/a.swift"},"position":{"line":1,"character":1}}}"#;

fn body(message: &OutgoingMessage) -> Value {
    serde_json::from_str(&message.to_body().expect("serialises")).expect("valid json")
}

fn single(reply: &Reply) -> Value {
    assert_eq!(reply.messages.len(), 1, "expected one message: {reply:?}");
    reply.messages.first().map(body).expect("one message")
}

fn frame(body: &str) -> String {
    format!("Content-Length: {}\r\n\r\n{body}", body.len())
}

fn initialized(dispatcher: Dispatcher) -> Dispatcher {
    let mut ready = dispatcher;
    ready.handle_body(INITIALIZE);
    ready.handle_body(r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#);
    ready
}

#[fixture]
fn dispatcher() -> Dispatcher {
    Dispatcher::new(VersionPolicy::Lenient)
}

#[rstest]
fn initialize_answers_with_capabilities(mut dispatcher: Dispatcher) {
    let response = single(&dispatcher.handle_body(INITIALIZE));

    assert_eq!(response.get("id"), Some(&json!(1)));
    assert!(response.pointer("/result/capabilities/textDocumentSync").is_some());
    assert_eq!(dispatcher.session().lifecycle(), Lifecycle::Initialized);
    assert_eq!(dispatcher.session().workspace_root(), Some("file:///p"));
}

#[rstest]
fn requests_before_initialize_are_rejected(mut dispatcher: Dispatcher) {
    let response = single(&dispatcher.handle_body(HOVER));

    assert_eq!(response.get("id"), Some(&json!(7)));
    assert_eq!(response.pointer("/error/code"), Some(&json!(-32002)));
}

#[rstest]
fn notifications_before_initialize_are_dropped(mut dispatcher: Dispatcher) {
    let reply = dispatcher.handle_body(OPEN);

    assert!(reply.messages.is_empty());
    assert!(dispatcher.documents().is_empty());
}

#[rstest]
fn second_initialize_is_invalid(dispatcher: Dispatcher) {
    let mut ready = initialized(dispatcher);
    let response = single(&ready.handle_body(INITIALIZE));

    assert_eq!(response.pointer("/error/code"), Some(&json!(-32600)));
}

#[rstest]
fn unknown_request_is_answered(dispatcher: Dispatcher) {
    let mut ready = initialized(dispatcher);
    let response = single(&ready.handle_body(r#"{"jsonrpc":"2.0","id":"q","method":"workspace/symbol"}"#));

    assert_eq!(response.get("id"), Some(&json!("q")));
    assert_eq!(response.pointer("/error/code"), Some(&json!(-32601)));
}

#[rstest]
#[case(r#"{"jsonrpc":"1.0","id":3,"method":"shutdown"}"#, Some(json!(3)))]
#[case(r#"{"id":3}"#, None)]
#[case("[1, 2]", None)]
#[case("not json", None)]
#[case(r#"{"jsonrpc":"2.0","id":[1],"method":"shutdown"}"#, None)]
fn invalid_envelopes_are_answered_only_when_correlated(
    mut dispatcher: Dispatcher,
    #[case] input: &str,
    #[case] id: Option<Value>,
) {
    let reply = dispatcher.handle_body(input);

    match id {
        Some(expected) => {
            let response = single(&reply);
            assert_eq!(response.get("id"), Some(&expected));
            assert_eq!(response.pointer("/error/code"), Some(&json!(-32600)));
        }
        None => assert!(reply.messages.is_empty()),
    }
}

#[rstest]
fn strict_policy_rejects_missing_version() {
    let mut strict = Dispatcher::new(VersionPolicy::Strict);
    let response = single(&strict.handle_body(r#"{"id":1,"method":"initialize"}"#));

    assert_eq!(response.pointer("/error/code"), Some(&json!(-32600)));
    assert_eq!(strict.session().lifecycle(), Lifecycle::Uninitialized);
}

#[rstest]
fn document_sync_tracks_full_text(dispatcher: Dispatcher) {
    let mut ready = initialized(dispatcher);
    assert!(ready.handle_body(OPEN).messages.is_empty());
    ready.handle_body(r#"{"jsonrpc":"2.0","method":"textDocument/didChange","params":{"textDocument":{"uri":"file:///p/Sources/App/a.swift","version":2},"contentChanges":[{"text":"xyz"}]}}"#);

    let document = ready
        .documents()
        .get("file:///p/Sources/App/a.swift")
        .expect("open");
    assert_eq!(document.text, "xyz");
    assert_eq!(document.version, 2);

    ready.handle_body(r#"{"jsonrpc":"2.0","method":"textDocument/didClose","params":{"textDocument":{"uri":"file:///p/Sources/App/a.swift"}}}"#);
    assert!(ready.documents().is_empty());
}

#[rstest]
fn change_to_unopened_document_is_logged_only(dispatcher: Dispatcher) {
    let mut ready = initialized(dispatcher);
    let reply = ready.handle_body(r#"{"jsonrpc":"2.0","method":"textDocument/didChange","params":{"textDocument":{"uri":"file:///q.swift"},"contentChanges":[{"text":"x"}]}}"#);

    assert!(reply.messages.is_empty());
    assert!(ready.documents().is_empty());
}

#[rstest]
fn text_request_on_unopened_document_is_invalid_params(dispatcher: Dispatcher) {
    let mut ready = initialized(dispatcher);
    let response = single(&ready.handle_body(HOVER));

    assert_eq!(response.pointer("/error/code"), Some(&json!(-32602)));
}

#[rstest]
fn text_request_past_the_last_line_is_invalid_params(dispatcher: Dispatcher) {
    let mut ready = initialized(dispatcher);
    ready.handle_body(OPEN);
    let response = single(&ready.handle_body(r#"{"jsonrpc":"2.0","id":8,"method":"textDocument/definition","params":{"textDocument":{"uri":"file:///p/Sources/App/a.swift"},"position":{"line":9,"character":0}}}"#));

    assert_eq!(response.get("id"), Some(&json!(8)));
    assert_eq!(response.pointer("/error/code"), Some(&json!(-32602)));
}

#[rstest]
fn unsupported_text_request_yields_null(dispatcher: Dispatcher) {
    let mut ready = initialized(dispatcher);
    ready.handle_body(OPEN);
    let response = single(&ready.handle_body(HOVER));

    assert_eq!(response.get("result"), Some(&Value::Null));
}

#[rstest]
fn text_request_reaches_the_backend_with_offset_and_context() {
    let mut analysis = MockAnalysis::new();
    analysis.expect_supports().return_const(true);
    analysis
        .expect_analyze()
        .withf(|request: &AnalysisRequest| {
            request.kind == TextRequestKind::Hover
                && request.offset == 4
                && request.path == Path::new("/p/Sources/App/a.swift")
                && request
                    .context
                    .as_ref()
                    .is_some_and(|context| context.module == "App")
        })
        .once()
        .returning(|_| Ok(json!({"contents": "Int"})));

    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .withf(|root: &Path, document: &Path| {
            root == Path::new("/p") && document == Path::new("/p/Sources/App/a.swift")
        })
        .once()
        .returning(|_, _| {
            Ok(CompilerContext {
                module: String::from("App"),
                ..CompilerContext::default()
            })
        });

    let mut ready = initialized(
        Dispatcher::new(VersionPolicy::Lenient)
            .with_analysis(Box::new(analysis))
            .with_resolver(Box::new(resolver)),
    );
    ready.handle_body(OPEN);
    let response = single(&ready.handle_body(HOVER));

    assert_eq!(response.get("id"), Some(&json!(7)));
    assert_eq!(response.pointer("/result/contents"), Some(&json!("Int")));
}

#[rstest]
fn resolver_failure_does_not_block_analysis() {
    let mut analysis = MockAnalysis::new();
    analysis.expect_supports().return_const(true);
    analysis
        .expect_analyze()
        .withf(|request: &AnalysisRequest| request.context.is_none())
        .once()
        .returning(|_| Ok(Value::Null));

    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .returning(|_, _| Err(CollaboratorError::unavailable("build manifest", "missing")));

    let mut ready = initialized(
        Dispatcher::new(VersionPolicy::Lenient)
            .with_analysis(Box::new(analysis))
            .with_resolver(Box::new(resolver)),
    );
    ready.handle_body(OPEN);
    let response = single(&ready.handle_body(HOVER));

    assert_eq!(response.get("result"), Some(&Value::Null));
}

#[rstest]
fn unavailable_backend_shows_a_warning_and_answers_null() {
    let mut analysis = MockAnalysis::new();
    analysis.expect_supports().return_const(true);
    analysis
        .expect_analyze()
        .returning(|_| Err(CollaboratorError::timeout("analyzer", 30)));

    let mut ready = initialized(
        Dispatcher::new(VersionPolicy::Lenient).with_analysis(Box::new(analysis)),
    );
    ready.handle_body(OPEN);
    let reply = ready.handle_body(HOVER);

    let bodies: Vec<Value> = reply.messages.iter().map(body).collect();
    assert_eq!(bodies.len(), 2);
    assert_eq!(
        bodies.first().and_then(|first| first.get("method")),
        Some(&json!("window/showMessage"))
    );
    assert_eq!(
        bodies.get(1).and_then(|second| second.get("result")),
        Some(&Value::Null)
    );
    assert_eq!(ready.session().lifecycle(), Lifecycle::Initialized);
}

#[rstest]
fn client_responses_are_ignored(mut dispatcher: Dispatcher) {
    assert_eq!(
        dispatcher.handle_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#),
        Reply::default()
    );
}

#[rstest]
fn serves_initialize_from_framed_input(mut dispatcher: Dispatcher) {
    let input = format!("Content-Length: 79\r\n\r\n{INITIALIZE}");
    assert_eq!(INITIALIZE.len(), 79);
    let mut output = Vec::new();

    let exit = dispatcher
        .serve(Cursor::new(input.into_bytes()), &mut output)
        .expect("serve succeeds");

    assert_eq!(exit, SessionExit::Unclean);
    let text = String::from_utf8(output).expect("utf-8");
    assert!(text.starts_with("Content-Length: "), "output: {text}");
    assert!(text.contains(r#""id":1"#));
    assert!(text.contains(r#""capabilities""#));
}

#[rstest]
#[case(true, SessionExit::Clean)]
#[case(false, SessionExit::Unclean)]
fn exit_code_reflects_shutdown(
    mut dispatcher: Dispatcher,
    #[case] shutdown: bool,
    #[case] expected: SessionExit,
) {
    let mut input = frame(INITIALIZE);
    if shutdown {
        input.push_str(&frame(r#"{"jsonrpc":"2.0","id":2,"method":"shutdown"}"#));
    }
    input.push_str(&frame(r#"{"jsonrpc":"2.0","method":"exit"}"#));
    input.push_str(&frame(r#"{"jsonrpc":"2.0","id":3,"method":"shutdown"}"#));
    let mut output = Vec::new();

    let exit = dispatcher
        .serve(Cursor::new(input.into_bytes()), &mut output)
        .expect("serve succeeds");

    assert_eq!(exit, expected);
    let text = String::from_utf8(output).expect("utf-8");
    assert!(!text.contains(r#""id":3"#), "nothing is read after exit");
}

#[rstest]
fn malformed_frames_are_skipped(mut dispatcher: Dispatcher) {
    let mut input = String::from("Content-Length: nope\r\n\r\n{}");
    input.push_str(&frame(INITIALIZE));
    let mut output = Vec::new();

    dispatcher
        .serve(Cursor::new(input.into_bytes()), &mut output)
        .expect("serve succeeds");

    assert_eq!(dispatcher.session().lifecycle(), Lifecycle::Initialized);
    assert_eq!(
        String::from_utf8(output)
            .expect("utf-8")
            .matches("Content-Length: ")
            .count(),
        1
    );
}
