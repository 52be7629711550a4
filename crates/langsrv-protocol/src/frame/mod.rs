//! `Content-Length` framing over a byte stream.
//!
//! Every message on the wire looks like:
//! ```text
//! Content-Length: <length>\r\n
//! Content-Type: application/vscode-jsonrpc; charset=utf-8\r\n
//! \r\n
//! <payload>
//! ```
//! The decoder is fed arbitrary chunks and yields whole bodies, so the result
//! never depends on how the input was split.

mod header;

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::error::FrameError;
use header::{Header, HeaderScan};

/// Tracing target for framing diagnostics.
pub(crate) const FRAME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::frame");

/// Content type written on every outgoing frame.
pub const CONTENT_TYPE: &str = "application/vscode-jsonrpc; charset=utf-8";

/// Largest header block accepted before the message is declared incomplete.
pub const MAX_HEADER_BYTES: usize = 8192;

const RESYNC_MARKER: &[u8] = b"Content-";

/// Incremental decoder turning byte chunks into message bodies.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    pending: Option<Header>,
    resyncing: bool,
    /// Body bytes of a rejected message still to be dropped.
    discarding: usize,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw input.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of buffered bytes not yet returned as a body.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the next complete body, or `Ok(None)` when more input is needed.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] for a message whose header or body cannot be
    /// accepted. The offending bytes are discarded first, so calling again
    /// continues with the following message.
    pub fn decode_next(&mut self) -> Result<Option<String>, FrameError> {
        if !self.skip_rejected_body() {
            return Ok(None);
        }
        if self.resyncing && !self.resync() {
            return Ok(None);
        }

        let header = match self.pending {
            Some(header) => header,
            None => match self.read_header()? {
                Some(header) => header,
                None => return Ok(None),
            },
        };

        if self.buffer.len() < header.content_length {
            self.pending = Some(header);
            return Ok(None);
        }

        self.pending = None;
        let body: Vec<u8> = self.buffer.drain(..header.content_length).collect();
        debug!(
            target: FRAME_TARGET,
            body_bytes = body.len(),
            buffered = self.buffer.len(),
            "decoded frame"
        );
        String::from_utf8(body)
            .map(Some)
            .map_err(|source| FrameError::InvalidBody { source })
    }

    /// Reports input left over once the byte source is exhausted.
    ///
    /// Trailing line breaks are not considered leftover input.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::BodyIncomplete`] when a body was cut short and
    /// [`FrameError::HeaderIncomplete`] when a header was never terminated.
    pub fn finish(&mut self) -> Result<(), FrameError> {
        let buffered = self.buffer.len();
        let pending = self.pending.take();
        self.discarding = 0;
        let stray = self.buffer.iter().any(|byte| !byte.is_ascii_whitespace());
        self.buffer.clear();

        if let Some(header) = pending {
            return Err(FrameError::BodyIncomplete {
                expected: header.content_length,
                received: buffered,
            });
        }
        if stray && !self.resyncing {
            return Err(FrameError::HeaderIncomplete { buffered });
        }
        Ok(())
    }

    fn read_header(&mut self) -> Result<Option<Header>, FrameError> {
        match header::scan(&self.buffer) {
            HeaderScan::Partial if self.buffer.len() > MAX_HEADER_BYTES => {
                let buffered = self.buffer.len();
                warn!(
                    target: FRAME_TARGET,
                    buffered,
                    limit = MAX_HEADER_BYTES,
                    "header exceeds size limit, discarding"
                );
                self.skip_to_next_header(1);
                Err(FrameError::HeaderIncomplete { buffered })
            }
            HeaderScan::Partial => Ok(None),
            HeaderScan::Complete { consumed } => {
                let parsed = self.buffer.get(..consumed).map(header::parse);
                match parsed {
                    Some(Ok(header)) => {
                        self.buffer.drain(..consumed);
                        Ok(Some(header))
                    }
                    Some(Err(error)) => {
                        self.reject(consumed);
                        Err(error)
                    }
                    None => Ok(None),
                }
            }
        }
    }

    /// Drops a rejected header of `consumed` bytes along with its body.
    ///
    /// When the header still declares a usable length, exactly that many body
    /// bytes are skipped; otherwise the body is scanned for the next header.
    fn reject(&mut self, consumed: usize) {
        let declared = self.buffer.get(..consumed).and_then(header::declared_length);
        let Some(length) = declared else {
            self.skip_to_next_header(consumed);
            return;
        };
        debug!(
            target: FRAME_TARGET,
            body_bytes = length,
            "skipping body of rejected frame"
        );
        self.pending = None;
        self.buffer.drain(..consumed);
        self.discarding = length;
        self.skip_rejected_body();
    }

    /// Drops pending rejected body bytes; returns `true` once none remain.
    fn skip_rejected_body(&mut self) -> bool {
        let skip = self.discarding.min(self.buffer.len());
        self.buffer.drain(..skip);
        self.discarding -= skip;
        self.discarding == 0
    }

    /// Drops bytes up to the next plausible header start at or after `from`.
    fn skip_to_next_header(&mut self, from: usize) {
        self.pending = None;
        let start = from.min(self.buffer.len());
        self.buffer.drain(..start);
        self.resyncing = true;
        self.resync();
    }

    /// Advances to the next header start; returns `true` once one is found.
    fn resync(&mut self) -> bool {
        if let Some(index) = find(&self.buffer, RESYNC_MARKER) {
            self.buffer.drain(..index);
            self.resyncing = false;
            return true;
        }
        // Keep a tail that may be the start of a marker split across chunks.
        let keep = RESYNC_MARKER.len().saturating_sub(1).min(self.buffer.len());
        let discard = self.buffer.len() - keep;
        self.buffer.drain(..discard);
        false
    }
}

/// Position of `needle` in `haystack`, ignoring ASCII case like header names.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Frames a body for the wire.
#[must_use]
pub fn encode(body: &str) -> Vec<u8> {
    let header = format!(
        "Content-Length: {}\r\nContent-Type: {CONTENT_TYPE}\r\n\r\n",
        body.len()
    );
    let mut frame = Vec::with_capacity(header.len() + body.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(body.as_bytes());
    frame
}

/// Writes one framed body and flushes the writer.
///
/// # Errors
///
/// Returns any I/O error raised by the writer.
pub fn write_frame<W: Write>(writer: &mut W, body: &str) -> io::Result<()> {
    writer.write_all(&encode(body))?;
    writer.flush()
}
