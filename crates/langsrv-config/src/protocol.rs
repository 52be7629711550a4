use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How strictly the `jsonrpc` version field is enforced on incoming bodies.
///
/// A present field must always equal `"2.0"`. The policy only decides what
/// happens when a client omits the field entirely.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VersionPolicy {
    /// Accept envelopes that omit the `jsonrpc` field.
    #[default]
    Lenient,
    /// Reject envelopes that omit the `jsonrpc` field.
    Strict,
}

impl VersionPolicy {
    /// Returns `true` when a missing version field must be rejected.
    #[must_use]
    pub const fn requires_version(self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Errors encountered while parsing a [`VersionPolicy`] from text.
pub type VersionPolicyParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("lenient", VersionPolicy::Lenient, false)]
    #[case("Strict", VersionPolicy::Strict, true)]
    fn parses_policy(#[case] input: &str, #[case] expected: VersionPolicy, #[case] strict: bool) {
        let policy = VersionPolicy::from_str(input).expect("policy parses");
        assert_eq!(policy, expected);
        assert_eq!(policy.requires_version(), strict);
    }
}
