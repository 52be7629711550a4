//! Session protocol engine for the `langsrv` language server.
//!
//! The crate sits between the framing layer in `langsrv-protocol` and the
//! analysis collaborators. A [`Dispatcher`] owns the [`Session`] lifecycle
//! and the [`DocumentStore`], resolves envelopes into [`Command`] values via
//! the [`CommandRegistry`], and answers requests through the
//! [`AnalysisBackend`] and [`CompilerContextResolver`] seams.
//!
//! Processing is single-threaded: each message runs to completion, including
//! any collaborator call, before the next one is decoded.

mod capabilities;
mod collaborator;
mod command;
mod dispatcher;
mod documents;
mod errors;
pub mod position;
mod registry;
mod session;

pub use capabilities::{SERVER_NAME, initialize_result};
pub use collaborator::{
    AnalysisBackend, AnalysisRequest, CollaboratorError, CompilerContext,
    CompilerContextResolver, DisabledAnalysis,
};
pub use command::{
    ClientInfo, Command, DocumentItem, InitializeParams, TextRequest, TextRequestKind,
};
pub use dispatcher::{Dispatcher, READ_CHUNK_BYTES, Reply, ResponseWriter};
pub use documents::{DocumentNotOpen, DocumentStore, OpenDocument};
pub use errors::{DispatchError, HandlerError, LifecycleError, ServeError};
pub use position::PositionError;
pub use registry::{CommandRegistry, Decoder, NotificationDecoder, RequestDecoder, Resolution};
pub use session::{Lifecycle, Session, SessionExit, Transition};

#[cfg(test)]
mod tests;
