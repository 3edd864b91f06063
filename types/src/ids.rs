//! Opaque record identifiers.
//!
//! Identifiers are 16 random bytes rendered as 32 lowercase hex characters.
//! They are minted from the entropy source in `attest-crypto`, never derived
//! from identity material.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

const ID_BYTES: usize = 16;

fn validate(raw: &str) -> bool {
    raw.len() == ID_BYTES * 2 && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Build an identifier from 16 random bytes.
            pub fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
                Self(crate::hash::hex::encode(&bytes))
            }

            /// Parse a client-supplied identifier.
            pub fn parse(raw: &str) -> Result<Self, TypesError> {
                if validate(raw) {
                    Ok(Self(raw.to_string()))
                } else {
                    Err(TypesError::InvalidId(raw.to_string()))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a [verification attempt](crate::VerificationStatus).
    VerificationId
);

opaque_id!(
    /// Identifier of an issued credential.
    BadgeId
);
