//! Conversion between protocol positions and byte offsets.
//!
//! Positions count lines and UTF-16 code units, as the protocol does by
//! default. Offsets are UTF-8 byte offsets into the document text. `\n`,
//! `\r`, and `\r\n` each end one line.

use lsp_types::Position;
use thiserror::Error;

/// A position or offset that does not exist in the text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    /// The line is past the end of the document.
    #[error("line {line} is out of range, the document has {line_count} lines")]
    LineOutOfRange {
        /// Requested line.
        line: u32,
        /// Lines in the document.
        line_count: u32,
    },

    /// The offset is past the end of the document.
    #[error("offset {offset} is out of range, the document is {length} bytes long")]
    OffsetOutOfRange {
        /// Requested offset.
        offset: usize,
        /// Document length in bytes.
        length: usize,
    },

    /// The offset falls inside a multi-byte character.
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary {
        /// Requested offset.
        offset: usize,
    },
}

fn utf16_units(ch: char) -> u32 {
    u32::from(ch > '\u{FFFF}') + 1
}

const fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r')
}

fn line_start(text: &str, line: u32) -> Result<usize, PositionError> {
    if line == 0 {
        return Ok(0);
    }

    let mut breaks = 0_u32;
    let mut chars = text.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        let end = match ch {
            '\n' => index + 1,
            '\r' => chars
                .next_if(|&(_, next)| next == '\n')
                .map_or(index + 1, |_| index + 2),
            _ => continue,
        };
        breaks = breaks.saturating_add(1);
        if breaks == line {
            return Ok(end);
        }
    }

    Err(PositionError::LineOutOfRange {
        line,
        line_count: breaks.saturating_add(1),
    })
}

/// Converts a protocol position into a byte offset.
///
/// A character past the end of its line clamps to the line end, and a
/// character inside a surrogate pair clamps to the start of that character.
///
/// # Errors
///
/// Returns [`PositionError::LineOutOfRange`] when the line does not exist.
pub fn offset_at(text: &str, position: Position) -> Result<usize, PositionError> {
    let start = line_start(text, position.line)?;
    let line = text.get(start..).unwrap_or_default();

    let mut units = 0_u32;
    for (index, ch) in line.char_indices() {
        let next = units.saturating_add(utf16_units(ch));
        if is_line_break(ch) || next > position.character {
            return Ok(start + index);
        }
        units = next;
    }
    Ok(text.len())
}

/// Converts a byte offset into a protocol position.
///
/// # Errors
///
/// Returns [`PositionError::OffsetOutOfRange`] past the end of the text and
/// [`PositionError::NotCharBoundary`] inside a multi-byte character.
pub fn position_at(text: &str, offset: usize) -> Result<Position, PositionError> {
    if offset > text.len() {
        return Err(PositionError::OffsetOutOfRange {
            offset,
            length: text.len(),
        });
    }
    let prefix = text
        .get(..offset)
        .ok_or(PositionError::NotCharBoundary { offset })?;

    let mut line = 0_u32;
    let mut character = 0_u32;
    let mut previous = None;
    for ch in prefix.chars() {
        match ch {
            '\n' if previous == Some('\r') => {}
            '\n' | '\r' => {
                line = line.saturating_add(1);
                character = 0;
            }
            _ => character = character.saturating_add(utf16_units(ch)),
        }
        previous = Some(ch);
    }
    Ok(Position::new(line, character))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn converts_offset_after_newline_both_ways() {
        let text = "ab\ncd";
        assert_eq!(position_at(text, 3), Ok(Position::new(1, 0)));
        assert_eq!(offset_at(text, Position::new(1, 0)), Ok(3));
    }

    #[rstest]
    #[case("ab\ncd", Position::new(1, 1), 4)]
    #[case("ab\r\ncd", Position::new(1, 1), 5)]
    #[case("ab\rcd", Position::new(1, 1), 4)]
    #[case("a\n\r\nb", Position::new(2, 0), 4)]
    #[case("a\u{1F600}b", Position::new(0, 3), 5)]
    #[case("h\u{e9}llo", Position::new(0, 2), 3)]
    fn round_trips_positions(#[case] text: &str, #[case] position: Position, #[case] offset: usize) {
        assert_eq!(offset_at(text, position), Ok(offset));
        assert_eq!(position_at(text, offset), Ok(position));
    }

    #[rstest]
    #[case("ab\ncd", Position::new(0, 40), 2)]
    #[case("ab\r\ncd", Position::new(0, 9), 2)]
    #[case("ab\ncd", Position::new(1, 40), 5)]
    #[case("a\u{1F600}b", Position::new(0, 2), 1)]
    fn clamps_characters_to_the_line(
        #[case] text: &str,
        #[case] position: Position,
        #[case] offset: usize,
    ) {
        assert_eq!(offset_at(text, position), Ok(offset));
    }

    #[rstest]
    fn trailing_empty_line_exists() {
        assert_eq!(offset_at("ab\n", Position::new(1, 0)), Ok(3));
        assert_eq!(
            offset_at("ab\n", Position::new(2, 0)),
            Err(PositionError::LineOutOfRange {
                line: 2,
                line_count: 2
            })
        );
    }

    #[rstest]
    fn rejects_offsets_outside_the_text() {
        assert_eq!(
            position_at("ab", 3),
            Err(PositionError::OffsetOutOfRange {
                offset: 3,
                length: 2
            })
        );
        assert_eq!(
            position_at("\u{e9}", 1),
            Err(PositionError::NotCharBoundary { offset: 1 })
        );
    }

    #[rstest]
    fn offset_between_carriage_return_and_line_feed_starts_the_next_line() {
        assert_eq!(position_at("a\r\nb", 2), Ok(Position::new(1, 0)));
    }
}
