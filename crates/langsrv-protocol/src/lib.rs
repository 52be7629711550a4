//! Wire-level building blocks for the `langsrv` language server.
//!
//! The crate turns a raw byte stream into JSON-RPC message bodies and back.
//! [`FrameDecoder`] reassembles `Content-Length` framed bodies from chunks of
//! arbitrary size, [`EnvelopeParser`] classifies each body as a request,
//! notification, or response, and the [`message`] types describe what the
//! server writes back.

mod envelope;
mod error;
mod frame;
pub mod message;

pub use envelope::{
    Envelope, EnvelopeParser, NotificationEnvelope, RequestEnvelope, RequestId, ResponseEnvelope,
};
pub use error::{EnvelopeError, FrameError};
pub use frame::{CONTENT_TYPE, FrameDecoder, MAX_HEADER_BYTES, encode, write_frame};
pub use message::{
    ErrorCode, NotificationMessage, OutgoingMessage, ResponseError, ResponseMessage,
    ResponsePayload,
};

/// Protocol version string carried in every envelope.
pub const JSONRPC_VERSION: &str = "2.0";
