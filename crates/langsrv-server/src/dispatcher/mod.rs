//! The serving loop.
//!
//! [`Dispatcher::serve`] reads chunks from a byte source, reassembles frames,
//! and runs every complete message through the envelope parser, the command
//! registry, the session state machine, and the command handlers. Each
//! message is answered before the next one is looked at, so responses leave
//! in request order.

mod handlers;
mod response;

use std::io::{self, Read, Write};

use langsrv_config::VersionPolicy;
use langsrv_protocol::{
    EnvelopeError, EnvelopeParser, ErrorCode, FrameDecoder, OutgoingMessage, RequestId,
    ResponseError, ResponseMessage,
};
use tracing::{debug, info, warn};

use crate::collaborator::{AnalysisBackend, CompilerContextResolver, DisabledAnalysis};
use crate::command::Command;
use crate::documents::DocumentStore;
use crate::errors::{HandlerError, ServeError};
use crate::registry::{CommandRegistry, Resolution};
use crate::session::{Session, SessionExit};

pub use response::ResponseWriter;

/// Tracing target for the serving loop.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Bytes requested from the source per read.
pub const READ_CHUNK_BYTES: usize = 8192;

/// Messages produced by one incoming body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    /// Messages to write, in order.
    pub messages: Vec<OutgoingMessage>,
    /// Set once the session has ended.
    pub exit: Option<SessionExit>,
}

impl Reply {
    const fn silent() -> Self {
        Self {
            messages: Vec::new(),
            exit: None,
        }
    }

    fn message(message: impl Into<OutgoingMessage>) -> Self {
        Self {
            messages: vec![message.into()],
            exit: None,
        }
    }

    fn failure(id: RequestId, error: ResponseError) -> Self {
        Self::message(ResponseMessage::failure(Some(id), error))
    }
}

/// Owns the session state and routes messages to handlers.
pub struct Dispatcher {
    parser: EnvelopeParser,
    registry: CommandRegistry,
    session: Session,
    documents: DocumentStore,
    analysis: Box<dyn AnalysisBackend>,
    resolver: Option<Box<dyn CompilerContextResolver>>,
}

impl Dispatcher {
    /// Creates a dispatcher with the standard methods and no analysis.
    #[must_use]
    pub fn new(policy: VersionPolicy) -> Self {
        Self {
            parser: EnvelopeParser::new(policy),
            registry: CommandRegistry::standard(),
            session: Session::new(),
            documents: DocumentStore::new(),
            analysis: Box::new(DisabledAnalysis),
            resolver: None,
        }
    }

    /// Replaces the method table.
    #[must_use]
    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Installs the analysis backend.
    #[must_use]
    pub fn with_analysis(mut self, analysis: Box<dyn AnalysisBackend>) -> Self {
        self.analysis = analysis;
        self
    }

    /// Installs the compiler context resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Box<dyn CompilerContextResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Session state.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Open documents.
    #[must_use]
    pub const fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Serves framed messages from `source` until `exit` or end of input.
    ///
    /// End of input before `exit` is an unclean exit.
    ///
    /// # Errors
    ///
    /// Returns a [`ServeError`] when reading, writing, or serialising fails.
    /// Malformed messages are logged and skipped instead.
    pub fn serve<R: Read, W: Write>(
        &mut self,
        mut source: R,
        sink: W,
    ) -> Result<SessionExit, ServeError> {
        let mut decoder = FrameDecoder::new();
        let mut writer = ResponseWriter::new(sink);
        let mut chunk = vec![0_u8; READ_CHUNK_BYTES];

        loop {
            if let Some(exit) = self.drain(&mut decoder, &mut writer)? {
                return Ok(exit);
            }

            let read = match source.read(&mut chunk) {
                Ok(0) => {
                    if let Err(error) = decoder.finish() {
                        warn!(target: DISPATCH_TARGET, %error, "input ended inside a frame");
                    }
                    info!(target: DISPATCH_TARGET, "input closed before exit");
                    return Ok(SessionExit::Unclean);
                }
                Ok(read) => read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(ServeError::Read(error)),
            };
            decoder.push(chunk.get(..read).unwrap_or_default());
        }
    }

    fn drain<W: Write>(
        &mut self,
        decoder: &mut FrameDecoder,
        writer: &mut ResponseWriter<W>,
    ) -> Result<Option<SessionExit>, ServeError> {
        loop {
            match decoder.decode_next() {
                Ok(Some(body)) => {
                    let reply = self.handle_body(&body);
                    writer.write_all(&reply.messages)?;
                    if reply.exit.is_some() {
                        return Ok(reply.exit);
                    }
                }
                Ok(None) => return Ok(None),
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "dropping malformed frame");
                }
            }
        }
    }

    /// Handles one message body.
    ///
    /// Requests always produce exactly one response; notifications produce
    /// none, apart from `window/showMessage` events.
    pub fn handle_body(&mut self, body: &str) -> Reply {
        let envelope = match self.parser.parse(body) {
            Ok(envelope) => envelope,
            Err(error) => return reject_envelope(&error),
        };

        match self.registry.resolve(envelope) {
            Ok(Resolution::Command(command)) => self.execute(command),
            Ok(Resolution::Ignored { .. }) => Reply::silent(),
            Ok(Resolution::ClientResponse(response)) => {
                debug!(
                    target: DISPATCH_TARGET,
                    id = ?response.id,
                    "ignoring response from client"
                );
                Reply::silent()
            }
            Err(error) => {
                let Some(id) = error.request_id().cloned() else {
                    warn!(target: DISPATCH_TARGET, %error, "dropping notification");
                    return Reply::silent();
                };
                debug!(target: DISPATCH_TARGET, %error, %id, "rejecting request");
                Reply::failure(id, error.to_response_error())
            }
        }
    }

    fn execute(&mut self, command: Command) -> Reply {
        let method = command.method();
        let id = command.request_id().cloned();

        let transition = match self.session.admit(&command) {
            Ok(transition) => transition,
            Err(error) => {
                let Some(request) = id else {
                    warn!(target: DISPATCH_TARGET, %error, "dropping notification");
                    return Reply::silent();
                };
                debug!(target: DISPATCH_TARGET, %error, id = %request, "rejecting request");
                return Reply::failure(request, error.to_response_error());
            }
        };

        match self.handle(command) {
            Ok(messages) => {
                let exit = self.session.commit(transition);
                if let Some(outcome) = exit {
                    info!(
                        target: DISPATCH_TARGET,
                        code = outcome.code(),
                        "session exited"
                    );
                }
                Reply { messages, exit }
            }
            Err(error) => handler_failure(method, id, error),
        }
    }
}

fn reject_envelope(error: &EnvelopeError) -> Reply {
    let Some(id) = error.request_id().cloned() else {
        warn!(target: DISPATCH_TARGET, %error, "dropping uncorrelated message");
        return Reply::silent();
    };
    debug!(target: DISPATCH_TARGET, %error, %id, "rejecting invalid request");
    Reply::failure(
        id,
        ResponseError::new(ErrorCode::InvalidRequest, error.to_string()),
    )
}

fn handler_failure(method: &str, id: Option<RequestId>, error: HandlerError) -> Reply {
    let Some(request) = id else {
        warn!(target: DISPATCH_TARGET, method, %error, "notification handler failed");
        return Reply::silent();
    };

    match error {
        HandlerError::CollaboratorUnavailable { source } => {
            warn!(target: DISPATCH_TARGET, method, error = %source, "collaborator unavailable");
            Reply {
                messages: vec![
                    handlers::show_warning(&source.to_string()).into(),
                    ResponseMessage::success(request, serde_json::Value::Null).into(),
                ],
                exit: None,
            }
        }
        other => {
            debug!(target: DISPATCH_TARGET, method, error = %other, "request failed");
            Reply::failure(request, other.to_response_error())
        }
    }
}

#[cfg(test)]
mod tests;
