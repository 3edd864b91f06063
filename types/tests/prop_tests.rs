use proptest::prelude::*;

use attest_types::{BadgeId, Commitment, LedgerAddress, Timestamp, VerificationId};

proptest! {
    /// Commitment roundtrip: new -> as_bytes produces identical bytes.
    #[test]
    fn commitment_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let c = Commitment::new(bytes);
        prop_assert_eq!(c.as_bytes(), &bytes);
    }

    /// Commitment hex encoding is lossless.
    #[test]
    fn commitment_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let c = Commitment::new(bytes);
        prop_assert_eq!(Commitment::from_hex(&c.to_hex()).unwrap(), c);
    }

    /// Commitment::is_zero is true only for all-zero bytes.
    #[test]
    fn commitment_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        prop_assert_eq!(Commitment::new(bytes).is_zero(), bytes == [0u8; 32]);
    }

    /// Ids minted from bytes always parse back.
    #[test]
    fn ids_parse_back(bytes in prop::array::uniform16(0u8..)) {
        let v = VerificationId::from_bytes(bytes);
        let b = BadgeId::from_bytes(bytes);
        prop_assert_eq!(VerificationId::parse(v.as_str()).unwrap(), v);
        prop_assert_eq!(BadgeId::parse(b.as_str()).unwrap(), b);
    }

    /// Any non-empty identifier-shaped string is a valid address.
    #[test]
    fn address_accepts_identifier_charset(s in "[A-Za-z0-9_]{1,128}") {
        prop_assert!(LedgerAddress::parse(s).is_ok());
    }

    /// Anything containing whitespace is rejected.
    #[test]
    fn address_rejects_whitespace(prefix in "[a-z0-9]{0,10}", suffix in "[a-z0-9]{0,10}") {
        let raw = format!("{prefix} {suffix}");
        prop_assert!(LedgerAddress::parse(raw).is_err());
    }

    /// Timestamp has_expired agrees with manual arithmetic.
    #[test]
    fn timestamp_has_expired_correct(
        start in 0u64..500_000,
        duration in 1u64..500_000,
        offset in 0u64..1_000_000,
    ) {
        let t = Timestamp::new(start);
        let now = Timestamp::new(start.saturating_add(offset));
        prop_assert_eq!(t.has_expired(duration, now), offset >= duration);
    }
}
