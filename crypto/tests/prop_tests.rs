use std::collections::HashSet;

use proptest::prelude::*;

use attest_crypto::{commit, nullifier, proof_hash};
use attest_types::{Commitment, LedgerAddress, Provider, Timestamp};

fn provider_strategy() -> impl Strategy<Value = Provider> {
    prop::sample::select(Provider::ALL.to_vec())
}

proptest! {
    /// The same (proposal, nonce) always yields the same nullifier.
    #[test]
    fn nullifier_is_deterministic(
        proposal in "[a-z0-9-]{1,40}",
        bytes in prop::array::uniform32(0u8..),
    ) {
        let nonce = Commitment::new(bytes);
        prop_assert_eq!(nullifier(&proposal, &nonce), nullifier(&proposal, &nonce));
    }

    /// Different proposals never share a nullifier for one credential.
    #[test]
    fn nullifier_separates_proposals(
        a in "[a-z0-9-]{1,40}",
        b in "[a-z0-9-]{1,40}",
        bytes in prop::array::uniform32(0u8..),
    ) {
        prop_assume!(a != b);
        let nonce = Commitment::new(bytes);
        prop_assert_ne!(nullifier(&a, &nonce), nullifier(&b, &nonce));
    }

    /// Different nonces never share a nullifier on one proposal.
    #[test]
    fn nullifier_separates_credentials(
        proposal in "[a-z0-9-]{1,40}",
        x in prop::array::uniform32(0u8..),
        y in prop::array::uniform32(0u8..),
    ) {
        prop_assume!(x != y);
        prop_assert_ne!(
            nullifier(&proposal, &Commitment::new(x)),
            nullifier(&proposal, &Commitment::new(y))
        );
    }

    /// Proof hashes are deterministic in all four inputs.
    #[test]
    fn proof_hash_is_deterministic(
        provider in provider_strategy(),
        address in "[A-Za-z0-9_]{1,64}",
        datum in ".{0,64}",
        ts in any::<u64>(),
    ) {
        let address = LedgerAddress::parse(address).unwrap();
        prop_assert_eq!(
            proof_hash(provider, &address, &datum, Timestamp::new(ts)),
            proof_hash(provider, &address, &datum, Timestamp::new(ts))
        );
    }

    /// Moving a byte across a field boundary changes the commitment.
    #[test]
    fn commit_respects_field_boundaries(left in "[a-z]{1,16}", right in "[a-z]{1,16}") {
        let joined = format!("{left}{right}");
        let (head, tail) = joined.split_at(1);
        prop_assume!(head != left);
        prop_assert_ne!(commit(&[&left, &right]), commit(&[head, tail]));
    }
}

/// A dense sample of distinct inputs produces distinct proof hashes.
#[test]
fn proof_hash_collision_sample() {
    let mut seen = HashSet::new();
    for provider in Provider::ALL {
        for i in 0..50u64 {
            let address = LedgerAddress::parse(format!("addr_{i}")).unwrap();
            for j in 0..20u64 {
                let datum = format!("profile-{j}");
                let hash = proof_hash(provider, &address, &datum, Timestamp::new(1_700_000_000 + j));
                assert!(seen.insert(hash), "collision at {provider:?} {i} {j}");
            }
        }
    }
    assert_eq!(seen.len(), Provider::ALL.len() * 50 * 20);
}
