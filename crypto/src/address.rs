//! Ledger addresses derived from holder public keys.
//!
//! `att_` followed by the 32-byte key and a 5-byte Blake2b checksum, both in
//! the lowercase base32 alphabet below. Derived addresses are 64 characters.

use attest_types::{LedgerAddress, PublicKey};

use crate::CryptoError;

const PREFIX: &str = "att_";

/// No `0`, `2`, `l` or `v`.
const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

const CHECKSUM_LEN: usize = 5;

/// Append `bytes` to `out` five bits at a time, zero-padding the last group.
fn push_base32(out: &mut String, bytes: &[u8]) {
    let mut acc: u16 = 0;
    let mut bits = 0u32;
    for &byte in bytes {
        acc = (acc << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(ALPHABET[usize::from((acc >> bits) & 0x1f)]));
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(char::from(ALPHABET[usize::from((acc << (5 - bits)) & 0x1f)]));
    }
}

/// The ledger address controlled by `public_key`.
pub fn derive_address(public_key: &PublicKey) -> Result<LedgerAddress, CryptoError> {
    let key = public_key.as_bytes();
    let checksum = crate::blake2b_256(key);

    let mut address = String::with_capacity(64);
    address.push_str(PREFIX);
    push_base32(&mut address, key);
    push_base32(&mut address, &checksum[..CHECKSUM_LEN]);
    Ok(LedgerAddress::parse(address)?)
}
