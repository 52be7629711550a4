//! Header block scanning and field parsing.

use tracing::trace;

use super::FRAME_TARGET;
use crate::error::FrameError;

const CONTENT_LENGTH: &str = "Content-Length";
const CONTENT_TYPE_FIELD: &str = "Content-Type";
const MEDIA_TYPE: &str = "application/vscode-jsonrpc";

/// Outcome of looking for the end of a header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum HeaderScan {
    /// Two consecutive line breaks were found; `consumed` bytes (terminator
    /// included) make up the header.
    Complete { consumed: usize },
    /// More input is needed.
    Partial,
}

/// Finds the end of the header block at the start of `buffer`.
///
/// `\r\n`, `\n`, and `\r` each count as one line break. A `\r` at the very end
/// of the buffer is undecided until the next byte arrives, so scanning stops
/// there and reports [`HeaderScan::Partial`].
pub(super) fn scan(buffer: &[u8]) -> HeaderScan {
    let mut breaks = 0_u8;
    let mut position = 0_usize;
    let mut bytes = buffer.iter().peekable();

    while let Some(&byte) = bytes.next() {
        position += 1;
        match byte {
            b'\r' => match bytes.peek() {
                None => return HeaderScan::Partial,
                Some(b'\n') => {
                    bytes.next();
                    position += 1;
                    breaks += 1;
                }
                Some(_) => breaks += 1,
            },
            b'\n' => breaks += 1,
            _ => breaks = 0,
        }
        if breaks == 2 {
            return HeaderScan::Complete { consumed: position };
        }
    }
    HeaderScan::Partial
}

/// Fields recognised in a header block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Header {
    pub(super) content_length: usize,
}

/// Parses a complete header block, terminator included.
pub(super) fn parse(block: &[u8]) -> Result<Header, FrameError> {
    let text = std::str::from_utf8(block)
        .map_err(|_| FrameError::invalid("header block is not valid UTF-8"))?;

    let mut content_length = None;
    for line in text.split(['\r', '\n']).filter(|line| !line.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FrameError::invalid(format!("header line '{line}' has no ':'")))?;
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(FrameError::invalid(format!(
                "header name '{name}' is empty or contains whitespace"
            )));
        }

        if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
            content_length = Some(parse_content_length(value.trim())?);
        } else if name.eq_ignore_ascii_case(CONTENT_TYPE_FIELD) {
            check_content_type(value.trim())?;
        } else {
            trace!(target: FRAME_TARGET, header = name, "ignoring unknown header field");
        }
    }

    content_length
        .map(|length| Header {
            content_length: length,
        })
        .ok_or_else(|| FrameError::invalid("missing Content-Length"))
}

/// Body length declared by a header block that was otherwise rejected.
///
/// Only a well-formed, positive `Content-Length` counts.
pub(super) fn declared_length(block: &[u8]) -> Option<usize> {
    let text = std::str::from_utf8(block).ok()?;
    text.split(['\r', '\n'])
        .filter_map(|line| line.split_once(':'))
        .filter(|(name, _)| name.eq_ignore_ascii_case(CONTENT_LENGTH))
        .find_map(|(_, value)| parse_content_length(value.trim()).ok())
}

fn parse_content_length(value: &str) -> Result<usize, FrameError> {
    match value.parse::<usize>() {
        Ok(0) => Err(FrameError::invalid("Content-Length must be positive")),
        Ok(length) => Ok(length),
        Err(_) => Err(FrameError::invalid(format!(
            "Content-Length '{value}' is not a number"
        ))),
    }
}

fn check_content_type(value: &str) -> Result<(), FrameError> {
    let mut parts = value.split(';').map(str::trim);
    let media_type = parts.next().unwrap_or_default();
    if !media_type.eq_ignore_ascii_case(MEDIA_TYPE) {
        return Err(FrameError::invalid(format!(
            "unsupported Content-Type '{media_type}'"
        )));
    }

    for parameter in parts.filter(|part| !part.is_empty()) {
        let Some((key, raw)) = parameter.split_once('=') else {
            return Err(FrameError::invalid(format!(
                "malformed Content-Type parameter '{parameter}'"
            )));
        };
        if !key.trim().eq_ignore_ascii_case("charset") {
            continue;
        }
        let charset = raw.trim().trim_matches('"');
        // `utf8` predates the registered name and is still sent by older clients.
        if !(charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8")) {
            return Err(FrameError::invalid(format!(
                "unsupported charset '{charset}'"
            )));
        }
    }
    Ok(())
}
