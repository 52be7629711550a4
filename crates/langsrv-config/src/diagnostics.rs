use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shape of the diagnostic records the server writes to stderr.
///
/// Stdout carries protocol frames only, so this never affects client traffic.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, with fields flattened into the record.
    #[default]
    Json,
    /// One human-readable line per event.
    Compact,
}

impl LogFormat {
    /// Returns `true` when records are meant for log collectors rather than
    /// people; such output never carries terminal colour codes.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
