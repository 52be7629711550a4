//! End-to-end runs of the `langsrv` binary over stdio.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use rstest::rstest;
use tempfile::TempDir;

fn frame(body: &str) -> String {
    format!("Content-Length: {}\r\n\r\n{body}", body.len())
}

fn langsrv(workdir: &TempDir) -> Command {
    let mut command = cargo_bin_cmd!("langsrv");
    command
        .current_dir(workdir.path())
        .env_remove("LANGSRV_CONFIG_PATH")
        .env("LANGSRV_LOG_FILTER", "off");
    command
}

const INITIALIZE: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"rootUri":null,"capabilities":{}}}"#;
const SHUTDOWN: &str = r#"{"jsonrpc":"2.0","id":2,"method":"shutdown"}"#;
const EXIT: &str = r#"{"jsonrpc":"2.0","method":"exit"}"#;

#[rstest]
fn orderly_shutdown_exits_with_zero() {
    let workdir = TempDir::new().expect("temp dir");
    let input = [INITIALIZE, SHUTDOWN, EXIT].map(frame).concat();

    langsrv(&workdir)
        .write_stdin(input)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("Content-Length: "))
        .stdout(predicate::str::contains(r#""name":"langsrv""#))
        .stdout(predicate::str::contains(r#""id":2"#));
}

#[rstest]
fn exit_without_shutdown_exits_with_one() {
    let workdir = TempDir::new().expect("temp dir");

    langsrv(&workdir)
        .write_stdin(frame(EXIT))
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty());
}

#[rstest]
fn closed_stdin_exits_with_one() {
    let workdir = TempDir::new().expect("temp dir");

    langsrv(&workdir)
        .write_stdin(frame(INITIALIZE))
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""capabilities""#));
}

#[rstest]
fn requests_before_initialize_are_rejected() {
    let workdir = TempDir::new().expect("temp dir");
    let hover = r#"{"jsonrpc":"2.0","id":7,"method":"textDocument/hover","params":{"textDocument":{"uri":"file:///a.swift"},"position":{"line":0,"character":0}}}"#;

    langsrv(&workdir)
        .write_stdin([hover, EXIT].map(frame).concat())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("-32002"));
}

#[rstest]
fn invalid_configuration_fails_before_serving() {
    let workdir = TempDir::new().expect("temp dir");

    langsrv(&workdir)
        .args(["--analyzer-timeout-secs", "soon"])
        .write_stdin(frame(EXIT))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("configuration"));
}

#[rstest]
#[case(&["--stdio"])]
#[case(&["--stdio", "--clientProcessId=4242"])]
fn client_launch_flags_are_accepted(#[case] args: &[&str]) {
    let workdir = TempDir::new().expect("temp dir");
    let input = [INITIALIZE, SHUTDOWN, EXIT].map(frame).concat();

    langsrv(&workdir)
        .args(args)
        .write_stdin(input)
        .assert()
        .code(0)
        .stdout(predicate::str::contains(r#""capabilities""#));
}
