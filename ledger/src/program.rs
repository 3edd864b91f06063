//! Function names, mapping names and value encoding of the ledger program.

use attest_types::VoteChoice;

/// Transition issuing a credential to an address.
pub const ISSUE_CREDENTIAL: &str = "issue_credential";

/// Transition recording a vote under a nullifier.
pub const CAST_VOTE: &str = "cast_vote";

/// address -> credential expiry height
pub const CREDENTIALS: &str = "credentials";

/// address -> bool
pub const REVOCATIONS: &str = "revocations";

/// nullifier -> bool
pub const NULLIFIERS: &str = "nullifiers";

/// "{proposal}:{choice}" -> vote count
pub const TALLIES: &str = "tallies";

pub fn tally_key(proposal_id: &str, choice: VoteChoice) -> String {
    format!("{proposal_id}:{}", choice.as_str())
}

/// Parse a numeric mapping value, tolerating a `u64`-style type suffix.
pub fn parse_u64(raw: &str) -> Option<u64> {
    let trimmed = raw.trim().trim_matches('"');
    let digits = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Parse a boolean mapping value.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().trim_matches('"') {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values() {
        assert_eq!(parse_u64("42"), Some(42));
        assert_eq!(parse_u64("42u64"), Some(42));
        assert_eq!(parse_u64("\"7u32\""), Some(7));
        assert_eq!(parse_u64("u64"), None);
        assert_eq!(parse_u64("abc"), None);
    }

    #[test]
    fn boolean_values() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool(" false "), Some(false));
        assert_eq!(parse_bool("1"), None);
    }

    #[test]
    fn tally_keys() {
        assert_eq!(tally_key("prop-1", VoteChoice::Abstain), "prop-1:abstain");
    }
}
