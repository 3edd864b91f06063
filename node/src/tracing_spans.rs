//! Pre-built [`tracing::Span`] constructors for pipeline operations.
//!
//! Consistent span names and field sets make it easy to filter and correlate
//! log lines for one request across the registries and the ledger bridge.
//! No span carries a nonce or a nullifier.

use tracing::{info_span, Span};

/// Span covering one verification submission.
pub fn verification_span(provider: &str, address: &str) -> Span {
    info_span!("verification", provider = %provider, address = %address)
}

/// Span covering one issuance request, from claim to ledger confirmation.
pub fn issuance_span(verification_id: &str, address: &str) -> Span {
    info_span!("issuance", verification_id = %verification_id, address = %address)
}

/// Span covering one vote, from credential check to ledger submission.
pub fn vote_span(proposal_id: &str) -> Span {
    info_span!("vote", proposal_id = %proposal_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_can_be_entered() {
        let _guard = verification_span("liveness", "addr1").entered();
        let _guard = issuance_span("v", "addr1").entered();
        let _guard = vote_span("prop-1").entered();
    }
}
