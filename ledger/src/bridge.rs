//! Stateless adapter between the pipeline and the ledger program.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use attest_types::{Commitment, LedgerAddress, VoteChoice};

use crate::program::{self, parse_bool, parse_u64};
use crate::{LedgerClient, LedgerError, TransactionId, Transition};

/// Default bound on any single ledger call.
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed access to the ledger program.
///
/// Holds no mutable state. Every call is bounded by `timeout`, and an elapsed
/// bound surfaces as [`LedgerError::Timeout`] so callers can leave their local
/// records in a not-yet-confirmed state.
#[derive(Clone)]
pub struct LedgerBridge {
    client: Arc<dyn LedgerClient>,
    program: String,
    fee: u64,
    timeout: Duration,
}

impl LedgerBridge {
    pub fn new(client: Arc<dyn LedgerClient>, program: impl Into<String>, fee: u64) -> Self {
        Self {
            client,
            program: program.into(),
            fee,
            timeout: DEFAULT_LEDGER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Submit the issuance transition for a credential.
    pub async fn issue_credential(
        &self,
        address: &LedgerAddress,
        proof_hash: &Commitment,
        expires_at_height: u64,
    ) -> Result<TransactionId, LedgerError> {
        let transition = Transition {
            program: self.program.clone(),
            function: program::ISSUE_CREDENTIAL.to_string(),
            inputs: vec![
                address.to_string(),
                proof_hash.to_hex(),
                expires_at_height.to_string(),
            ],
            fee: self.fee,
        };
        let tx = self
            .bounded("issue_credential", self.client.submit(transition))
            .await?;
        tracing::info!(address = %address, transaction_id = %tx, "credential issuance submitted");
        Ok(tx)
    }

    /// Submit a vote. A nullifier already on-chain comes back as
    /// [`RejectReason::AlreadyVoted`](crate::RejectReason::AlreadyVoted).
    pub async fn cast_vote(
        &self,
        proposal_id: &str,
        nullifier: &Commitment,
        choice: VoteChoice,
    ) -> Result<TransactionId, LedgerError> {
        let transition = Transition {
            program: self.program.clone(),
            function: program::CAST_VOTE.to_string(),
            inputs: vec![
                proposal_id.to_string(),
                nullifier.to_hex(),
                choice.as_u8().to_string(),
            ],
            fee: self.fee,
        };
        let tx = self.bounded("cast_vote", self.client.submit(transition)).await?;
        tracing::info!(proposal_id, transaction_id = %tx, "vote submitted");
        Ok(tx)
    }

    pub async fn read_mapping(&self, mapping: &str, key: &str) -> Result<Option<String>, LedgerError> {
        self.bounded(
            "read_mapping",
            self.client.read_mapping(&self.program, mapping, key),
        )
        .await
    }

    pub async fn current_height(&self) -> Result<u64, LedgerError> {
        self.bounded("current_height", self.client.current_height())
            .await
    }

    /// Expiry height of the credential the ledger holds for `address`.
    pub async fn credential_expiry(&self, address: &LedgerAddress) -> Result<Option<u64>, LedgerError> {
        match self
            .read_mapping(program::CREDENTIALS, address.as_str())
            .await?
        {
            None => Ok(None),
            Some(raw) => parse_u64(&raw)
                .map(Some)
                .ok_or_else(|| LedgerError::InvalidResponse(format!("credential value `{raw}`"))),
        }
    }

    /// Whether the ledger has revoked the credential of `address`.
    pub async fn is_revoked(&self, address: &LedgerAddress) -> Result<bool, LedgerError> {
        match self
            .read_mapping(program::REVOCATIONS, address.as_str())
            .await?
        {
            None => Ok(false),
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| LedgerError::InvalidResponse(format!("revocation value `{raw}`"))),
        }
    }

    /// Whether a nullifier is already recorded.
    pub async fn nullifier_spent(&self, nullifier: &Commitment) -> Result<bool, LedgerError> {
        match self
            .read_mapping(program::NULLIFIERS, &nullifier.to_hex())
            .await?
        {
            None => Ok(false),
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| LedgerError::InvalidResponse(format!("nullifier value `{raw}`"))),
        }
    }

    /// Current count for one choice on a proposal (absent counts as zero).
    pub async fn tally(&self, proposal_id: &str, choice: VoteChoice) -> Result<u64, LedgerError> {
        let key = program::tally_key(proposal_id, choice);
        match self.read_mapping(program::TALLIES, &key).await? {
            None => Ok(0),
            Some(raw) => parse_u64(&raw)
                .ok_or_else(|| LedgerError::InvalidResponse(format!("tally value `{raw}`"))),
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(operation, error = %e, "ledger call failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "ledger call timed out");
                Err(LedgerError::Timeout {
                    operation,
                    millis: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RejectReason;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        submitted: Mutex<Vec<Transition>>,
        mappings: Mutex<HashMap<(String, String), String>>,
        stall: bool,
        reject: Option<String>,
    }

    #[async_trait]
    impl LedgerClient for Recording {
        async fn submit(&self, transition: Transition) -> Result<TransactionId, LedgerError> {
            if self.stall {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if let Some(msg) = &self.reject {
                return Err(LedgerError::Rejected(RejectReason::classify(msg)));
            }
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push(transition);
            Ok(TransactionId::new(format!("at1tx{}", submitted.len())))
        }

        async fn read_mapping(
            &self,
            _program: &str,
            mapping: &str,
            key: &str,
        ) -> Result<Option<String>, LedgerError> {
            Ok(self
                .mappings
                .lock()
                .unwrap()
                .get(&(mapping.to_string(), key.to_string()))
                .cloned())
        }

        async fn current_height(&self) -> Result<u64, LedgerError> {
            Ok(100)
        }
    }

    fn bridge(client: Recording) -> (Arc<Recording>, LedgerBridge) {
        let client = Arc::new(client);
        let bridge = LedgerBridge::new(client.clone(), "attest_badge.aleo", 1_000);
        (client, bridge)
    }

    #[tokio::test]
    async fn issuance_encodes_inputs() {
        let (client, bridge) = bridge(Recording::default());
        let addr = LedgerAddress::parse("addr1").unwrap();
        let tx = bridge
            .issue_credential(&addr, &Commitment::new([1u8; 32]), 1_000_100)
            .await
            .unwrap();
        assert_eq!(tx.as_str(), "at1tx1");

        let submitted = client.submitted.lock().unwrap();
        assert_eq!(submitted[0].function, program::ISSUE_CREDENTIAL);
        assert_eq!(submitted[0].program, "attest_badge.aleo");
        assert_eq!(submitted[0].fee, 1_000);
        assert_eq!(submitted[0].inputs[0], "addr1");
        assert_eq!(submitted[0].inputs[2], "1000100");
    }

    #[tokio::test]
    async fn stalled_submission_times_out() {
        let (_, bridge) = bridge(Recording {
            stall: true,
            ..Default::default()
        });
        let bridge = bridge.with_timeout(Duration::from_millis(50));
        let err = bridge
            .cast_vote("p1", &Commitment::new([2u8; 32]), VoteChoice::Yes)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn rejection_reason_propagates() {
        let (_, bridge) = bridge(Recording {
            reject: Some("nullifier already exists".into()),
            ..Default::default()
        });
        let err = bridge
            .cast_vote("p1", &Commitment::new([2u8; 32]), VoteChoice::No)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(RejectReason::AlreadyVoted)));
    }

    #[tokio::test]
    async fn mapping_helpers() {
        let (client, bridge) = bridge(Recording::default());
        let addr = LedgerAddress::parse("addr1").unwrap();
        assert_eq!(bridge.credential_expiry(&addr).await.unwrap(), None);
        assert!(!bridge.is_revoked(&addr).await.unwrap());
        assert_eq!(bridge.tally("p1", VoteChoice::Yes).await.unwrap(), 0);

        {
            let mut m = client.mappings.lock().unwrap();
            m.insert((program::CREDENTIALS.into(), "addr1".into()), "1000100u32".into());
            m.insert((program::REVOCATIONS.into(), "addr1".into()), "true".into());
            m.insert((program::TALLIES.into(), "p1:yes".into()), "3u64".into());
        }
        assert_eq!(bridge.credential_expiry(&addr).await.unwrap(), Some(1_000_100));
        assert!(bridge.is_revoked(&addr).await.unwrap());
        assert_eq!(bridge.tally("p1", VoteChoice::Yes).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn nullifier_value_is_parsed() {
        let (client, bridge) = bridge(Recording::default());
        let spent = Commitment::new([3u8; 32]);
        let cleared = Commitment::new([4u8; 32]);
        let garbage = Commitment::new([5u8; 32]);
        assert!(!bridge.nullifier_spent(&spent).await.unwrap());

        {
            let mut m = client.mappings.lock().unwrap();
            m.insert((program::NULLIFIERS.into(), spent.to_hex()), "true".into());
            m.insert((program::NULLIFIERS.into(), cleared.to_hex()), "false".into());
            m.insert((program::NULLIFIERS.into(), garbage.to_hex()), "7u8".into());
        }
        assert!(bridge.nullifier_spent(&spent).await.unwrap());
        assert!(!bridge.nullifier_spent(&cleared).await.unwrap());
        assert!(matches!(
            bridge.nullifier_spent(&garbage).await,
            Err(LedgerError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn malformed_credential_value_is_invalid() {
        let (client, bridge) = bridge(Recording::default());
        let addr = LedgerAddress::parse("addr1").unwrap();
        client
            .mappings
            .lock()
            .unwrap()
            .insert((program::CREDENTIALS.into(), "addr1".into()), "soon".into());
        assert!(matches!(
            bridge.credential_expiry(&addr).await,
            Err(LedgerError::InvalidResponse(_))
        ));
    }
}
