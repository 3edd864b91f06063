//! Ledger bridge.
//!
//! The external ledger is the system of record for issued credentials,
//! revocations, vote nullifiers and tallies. This crate is the only place the
//! pipeline talks to it:
//!
//! - [`LedgerClient`]: the raw submit / read-mapping / height contract
//! - [`HttpLedgerClient`]: a REST node adapter for that contract
//! - [`LedgerBridge`]: stateless adapter adding bounded timeouts, the program's
//!   transition encoding, and typed failure classification

pub mod bridge;
pub mod client;
pub mod error;
pub mod http;
pub mod program;

pub use bridge::{LedgerBridge, DEFAULT_LEDGER_TIMEOUT};
pub use client::{LedgerClient, TransactionId, Transition};
pub use error::{LedgerError, RejectReason};
pub use http::HttpLedgerClient;
