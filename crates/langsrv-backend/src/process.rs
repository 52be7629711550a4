//! Analysis backend that runs an external command per request.
//!
//! [`ProcessAnalyzer`] spawns the configured command, writes the request to
//! its stdin as a single JSON line, and reads one JSON line back from stdout.
//! The reply is either `{"status":"ok","result":...}` or
//! `{"status":"error","message":"..."}`. Stdout and stderr are read on
//! helper threads so the timeout also covers a child that never answers.

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use langsrv_config::Config;
use langsrv_server::{AnalysisBackend, AnalysisRequest, CollaboratorError, TextRequestKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Tracing target for analyzer process operations.
const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

const COLLABORATOR: &str = "analyzer";

/// Least time given to stderr to drain once the exchange is over.
const STDERR_GRACE: Duration = Duration::from_millis(100);

/// Request line written to the analyzer.
#[derive(Debug, Serialize)]
struct RequestLine<'a> {
    kind: TextRequestKind,
    path: &'a Path,
    text: &'a str,
    offset: usize,
    module: Option<&'a str>,
    arguments: Vec<String>,
}

/// Reply line read from the analyzer.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum ReplyLine {
    Ok {
        #[serde(default)]
        result: Value,
    },
    Error {
        message: String,
    },
}

/// Runs an external analyzer command for every text request.
#[derive(Debug, Clone)]
pub struct ProcessAnalyzer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    kinds: HashSet<TextRequestKind>,
}

impl ProcessAnalyzer {
    /// Creates an analyzer answering every request kind.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            kinds: TextRequestKind::ALL.into_iter().collect(),
        }
    }

    /// Builds the analyzer described by `config`, if a command is configured.
    #[must_use]
    pub fn from_config(config: &Config) -> Option<Self> {
        config.analyzer_command().map(|program| {
            Self::new(
                program,
                config.analyzer_args().to_vec(),
                config.analyzer_timeout(),
            )
        })
    }

    /// Restricts the request kinds the analyzer claims to support.
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = TextRequestKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    /// Program that is spawned.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn encode(request: &AnalysisRequest) -> Result<String, CollaboratorError> {
        let line = RequestLine {
            kind: request.kind,
            path: &request.path,
            text: &request.text,
            offset: request.offset,
            module: request.context.as_ref().map(|context| context.module.as_str()),
            arguments: request
                .context
                .as_ref()
                .map(langsrv_server::CompilerContext::arguments)
                .unwrap_or_default(),
        };
        serde_json::to_string(&line).map_err(|error| {
            CollaboratorError::failed(COLLABORATOR, format!("cannot encode request: {error}"))
        })
    }

    fn spawn(&self) -> Result<Child, CollaboratorError> {
        debug!(
            target: PROCESS_TARGET,
            program = %self.program,
            "spawning analyzer process"
        );
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                CollaboratorError::unavailable(
                    COLLABORATOR,
                    format!("failed to start '{}': {error}", self.program),
                )
            })
    }

    fn exchange(&self, line: &str) -> Result<String, CollaboratorError> {
        let started = Instant::now();
        let mut child = self.spawn()?;
        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().map(spawn_stderr_reader);

        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut reply = String::new();
            let outcome = BufReader::new(stdout)
                .read_line(&mut reply)
                .map(|_| reply);
            drop(sender.send(outcome));
        });

        let reply = write_request(stdin, line).and_then(|()| {
            match receiver.recv_timeout(self.timeout) {
                Ok(Ok(reply)) => {
                    let remaining = self.timeout.saturating_sub(started.elapsed());
                    self.wait_for_exit(&mut child, remaining).map(|()| reply)
                }
                Ok(Err(error)) => Err(CollaboratorError::failed(
                    COLLABORATOR,
                    format!("cannot read stdout: {error}"),
                )),
                Err(_) => {
                    warn!(
                        target: PROCESS_TARGET,
                        program = %self.program,
                        timeout_secs = self.timeout.as_secs(),
                        "analyzer timed out, killing process"
                    );
                    Err(CollaboratorError::timeout(
                        COLLABORATOR,
                        self.timeout.as_secs(),
                    ))
                }
            }
        });
        if reply.is_err() {
            terminate(&mut child);
        }

        if let Some(output) = stderr {
            let remaining = self.timeout.saturating_sub(started.elapsed());
            log_stderr(&self.program, &output, remaining.max(STDERR_GRACE));
        }
        reply
    }

    fn wait_for_exit(&self, child: &mut Child, timeout: Duration) -> Result<(), CollaboratorError> {
        let start = Instant::now();
        let poll_interval = Duration::from_millis(20);

        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(CollaboratorError::failed(
                        COLLABORATOR,
                        format!("'{}' exited with {status}", self.program),
                    ));
                }
                Ok(None) if start.elapsed() > timeout => {
                    return Err(CollaboratorError::timeout(
                        COLLABORATOR,
                        self.timeout.as_secs(),
                    ));
                }
                Ok(None) => thread::sleep(poll_interval),
                Err(error) => {
                    return Err(CollaboratorError::failed(
                        COLLABORATOR,
                        format!("cannot wait for '{}': {error}", self.program),
                    ));
                }
            }
        }
    }
}

impl AnalysisBackend for ProcessAnalyzer {
    fn supports(&self, kind: TextRequestKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn analyze(&self, request: &AnalysisRequest) -> Result<Value, CollaboratorError> {
        let line = Self::encode(request)?;
        let reply = self.exchange(&line)?;
        parse_reply(&reply)
    }
}

fn missing_pipe(pipe: &str) -> CollaboratorError {
    CollaboratorError::unavailable(COLLABORATOR, format!("failed to capture {pipe}"))
}

/// Writes the request line and closes stdin.
fn write_request(mut stdin: ChildStdin, line: &str) -> Result<(), CollaboratorError> {
    debug!(
        target: PROCESS_TARGET,
        request_bytes = line.len(),
        "writing request to analyzer stdin"
    );
    let written = stdin
        .write_all(line.as_bytes())
        .and_then(|()| stdin.write_all(b"\n"))
        .and_then(|()| stdin.flush());
    // Closing stdin signals the end of the request.
    drop(stdin);
    written.map_err(|error| {
        CollaboratorError::failed(COLLABORATOR, format!("cannot write stdin: {error}"))
    })
}

fn spawn_stderr_reader(stderr: impl Read + Send + 'static) -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = String::new();
        drop(BufReader::new(stderr).read_to_string(&mut buffer));
        drop(sender.send(buffer));
    });
    receiver
}

/// Logs captured stderr, waiting at most `wait` for the stream to close.
///
/// A descendant of the analyzer may keep stderr open after the analyzer
/// itself was killed; its output is then abandoned.
fn log_stderr(program: &str, output: &Receiver<String>, wait: Duration) {
    let Ok(buffer) = output.recv_timeout(wait) else {
        debug!(
            target: PROCESS_TARGET,
            program,
            "analyzer stderr still open, not waiting for it"
        );
        return;
    };
    if !buffer.trim().is_empty() {
        debug!(
            target: PROCESS_TARGET,
            program,
            stderr = %buffer.trim(),
            "analyzer stderr output"
        );
    }
}

fn terminate(child: &mut Child) {
    drop(child.kill());
    drop(child.wait());
}

fn parse_reply(line: &str) -> Result<Value, CollaboratorError> {
    if line.trim().is_empty() {
        return Err(CollaboratorError::failed(
            COLLABORATOR,
            "analyzer produced no output on stdout",
        ));
    }
    match serde_json::from_str(line.trim()) {
        Ok(ReplyLine::Ok { result }) => Ok(result),
        Ok(ReplyLine::Error { message }) => Err(CollaboratorError::failed(COLLABORATOR, message)),
        Err(error) => Err(CollaboratorError::failed(
            COLLABORATOR,
            format!("invalid reply: {error}"),
        )),
    }
}
