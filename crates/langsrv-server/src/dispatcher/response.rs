//! Framed output for the serving loop.

use std::io::Write;

use langsrv_protocol::{OutgoingMessage, write_frame};
use tracing::debug;

use super::DISPATCH_TARGET;
use crate::errors::ServeError;

/// Writer that frames outgoing messages onto the byte sink.
///
/// Nothing else may write to the sink, otherwise the client loses framing.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps the byte sink.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialises and frames one message, then flushes.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError::Serialize`] or [`ServeError::Write`].
    pub fn write_message(&mut self, message: &OutgoingMessage) -> Result<(), ServeError> {
        let body = message.to_body()?;
        write_frame(&mut self.writer, &body).map_err(ServeError::Write)?;
        debug!(
            target: DISPATCH_TARGET,
            id = ?message.response_id(),
            body_bytes = body.len(),
            "wrote frame"
        );
        Ok(())
    }

    /// Writes every message in order.
    ///
    /// # Errors
    ///
    /// Stops at the first message that cannot be written.
    pub fn write_all(&mut self, messages: &[OutgoingMessage]) -> Result<(), ServeError> {
        messages
            .iter()
            .try_for_each(|message| self.write_message(message))
    }

    /// Returns the wrapped sink.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}
