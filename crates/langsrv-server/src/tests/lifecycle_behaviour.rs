//! Behavioural tests for the session lifecycle.

use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

use super::support::{SessionWorld, world};
use crate::Lifecycle;

#[given("a fresh session")]
fn given_fresh_session(world: &mut SessionWorld) {
    assert_eq!(world.lifecycle(), Lifecycle::Uninitialized);
}

#[given("an initialized session")]
fn given_initialized_session(world: &mut SessionWorld) {
    world.initialize(100);
}

#[when("the client sends initialize with id {id}")]
fn when_initialize(world: &mut SessionWorld, id: i64) {
    world.request(id, "initialize", json!({"rootUri": "file:///p"}));
}

#[when("the client sends shutdown with id {id}")]
fn when_shutdown(world: &mut SessionWorld, id: i64) {
    world.request(id, "shutdown", json!(null));
}

#[when("the client sends exit")]
fn when_exit(world: &mut SessionWorld) {
    world.notify("exit", json!(null));
}

#[when("the client sends hover with id {id}")]
fn when_hover(world: &mut SessionWorld, id: i64) {
    world.hover(id, "file:///p/a.swift");
}

#[then("the response to {id} carries capabilities")]
fn then_capabilities(world: &mut SessionWorld, id: i64) {
    let response = world.response(id);
    assert!(
        response.pointer("/result/capabilities").is_some(),
        "expected capabilities, got {response}"
    );
}

#[then("the response to {id} is an error with code {code}")]
fn then_error_code(world: &mut SessionWorld, id: i64, code: i64) {
    let response = world.response(id);
    assert_eq!(
        response.pointer("/error/code"),
        Some(&json!(code)),
        "unexpected response {response}"
    );
}

#[then("the session is \"{state}\"")]
fn then_session_state(world: &mut SessionWorld, state: String) {
    assert_eq!(world.lifecycle().to_string(), state);
}

#[then("the session exits with code {code}")]
fn then_exit_code(world: &mut SessionWorld, code: u8) {
    let exit = world.exit().expect("session has exited");
    assert_eq!(exit.code(), code);
    assert_eq!(world.lifecycle(), Lifecycle::Exited);
}

#[scenario(path = "tests/features/session_lifecycle.feature")]
fn session_lifecycle_behaviour(world: SessionWorld) {
    let _ = world;
}
