//! The request orchestrators.
//!
//! [`Pipeline`] sequences the verification registry, the credential registry
//! and the ledger bridge for each public operation, authenticates holders
//! through the configured [`SignatureVerifier`], and reports every failure as
//! a typed [`PipelineError`].

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use attest_badge::{BadgeError, CredentialRecord, CredentialRegistry, IssuanceGrant};
use attest_crypto::{nullifier, EntropySource, OsEntropy};
use attest_ledger::{HttpLedgerClient, LedgerBridge, LedgerClient, TransactionId};
use attest_types::{
    BadgeStatus, Clock, Commitment, LedgerAddress, Provider, SystemClock, VerificationId,
    VoteChoice,
};
use attest_verification::{
    HttpRegistryProvider, IdentityProvider, SubmitOutcome, VerificationRecord,
    VerificationRegistry,
};
use serde::Serialize;
use tracing::Instrument;

use crate::admission::AdmissionControl;
use crate::config::NodeConfig;
use crate::metrics::NodeMetrics;
use crate::signature::{messages, HolderProof, SignatureVerifier};
use crate::tracing_spans::{issuance_span, verification_span, vote_span};
use crate::{NodeError, PipelineError};

const MAX_PROPOSAL_ID_LEN: usize = 64;

/// The external collaborators a pipeline runs against.
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub entropy: Arc<dyn EntropySource>,
    pub ledger: Arc<dyn LedgerClient>,
    pub providers: Vec<Arc<dyn IdentityProvider>>,
}

impl Collaborators {
    /// System clock, OS entropy, and the HTTP adapters named in `config`.
    pub fn from_config(config: &NodeConfig) -> Result<Self, NodeError> {
        let endpoint = url::Url::parse(&config.ledger.endpoint)
            .map_err(|e| NodeError::Config(format!("ledger.endpoint: {e}")))?;
        let ledger = HttpLedgerClient::new(&endpoint, Duration::from_secs(config.ledger.timeout_secs))
            .map_err(|e| NodeError::Config(format!("ledger http client: {e}")))?;

        let provider_timeout = Duration::from_secs(config.providers.timeout_secs);
        let mut providers: Vec<Arc<dyn IdentityProvider>> = Vec::new();
        for (provider, raw) in config.providers.configured() {
            let base = url::Url::parse(raw)
                .map_err(|e| NodeError::Config(format!("providers.{provider}: {e}")))?;
            let adapter = HttpRegistryProvider::new(provider, &base, provider_timeout)
                .map_err(|e| NodeError::Config(format!("providers.{provider} http client: {e}")))?;
            providers.push(Arc::new(adapter));
        }

        Ok(Self {
            clock: Arc::new(SystemClock),
            entropy: Arc::new(OsEntropy),
            ledger: Arc::new(ledger),
            providers,
        })
    }
}

/// Result of a vote submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteReceipt {
    pub transaction_id: TransactionId,
    pub nullifier: Commitment,
}

/// Ledger tallies for one proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
}

impl Tally {
    /// Sum of all choices. Ledger counts are untrusted, so it saturates.
    pub fn total(&self) -> u64 {
        self.yes.saturating_add(self.no).saturating_add(self.abstain)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health {
    /// `None` when the ledger could not be reached.
    pub ledger_height: Option<u64>,
}

/// Sequences the registries and the ledger for every public operation.
pub struct Pipeline {
    verifications: VerificationRegistry,
    credentials: CredentialRegistry,
    signatures: Arc<dyn SignatureVerifier>,
    admission: AdmissionControl,
    metrics: Arc<NodeMetrics>,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    pub fn new(
        verifications: VerificationRegistry,
        credentials: CredentialRegistry,
        signatures: Arc<dyn SignatureVerifier>,
        admission: AdmissionControl,
        metrics: Arc<NodeMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifications,
            credentials,
            signatures,
            admission,
            metrics,
            clock,
        }
    }

    /// Wire a pipeline from configuration and collaborators.
    pub fn from_config(config: &NodeConfig, deps: Collaborators) -> Self {
        let params = config.issuance_params();
        let metrics = Arc::new(NodeMetrics::new());

        let mut verifications = VerificationRegistry::new(
            deps.clock.clone(),
            deps.entropy.clone(),
            params.verification_ttl_secs,
        )
        .with_provider_timeout(Duration::from_secs(config.providers.timeout_secs));
        for adapter in deps.providers {
            tracing::info!(provider = %adapter.provider(), "identity provider enabled");
            verifications = verifications.with_provider(adapter);
        }

        let bridge = LedgerBridge::new(deps.ledger, config.ledger.program.clone(), config.ledger.fee)
            .with_timeout(Duration::from_secs(config.ledger.timeout_secs));
        let credentials =
            CredentialRegistry::new(bridge, deps.clock.clone(), deps.entropy, params);

        let admission = AdmissionControl::new(
            config.limits.default,
            config.limits.verification,
            config.limits.issuance,
            deps.clock.clone(),
            metrics.clone(),
        );

        Self::new(
            verifications,
            credentials,
            config.signature_mode.verifier(),
            admission,
            metrics,
            deps.clock,
        )
    }

    pub fn admission(&self) -> &AdmissionControl {
        &self.admission
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    pub fn credentials(&self) -> &CredentialRegistry {
        &self.credentials
    }

    /// Check an identity claim with `provider` and record the outcome.
    ///
    /// Idempotent for an address that already holds a live verification.
    pub async fn submit_verification(
        &self,
        provider: &str,
        address: &str,
        payload: serde_json::Value,
    ) -> Result<SubmitOutcome, PipelineError> {
        let span = verification_span(provider, address);
        let provider = Provider::from_str(provider)?;
        let address = LedgerAddress::parse(address)?;

        let result = self
            .verifications
            .submit(provider, address, payload)
            .instrument(span)
            .await
            .map_err(PipelineError::from);
        let label = match &result {
            Ok(outcome) if outcome.reused => "reused",
            Ok(outcome) => outcome.record.status.as_str(),
            Err(_) => "error",
        };
        self.metrics
            .verifications_total
            .with_label_values(&[label])
            .inc();
        result
    }

    pub fn verification_status(&self, id: &str) -> Result<VerificationRecord, PipelineError> {
        let id = parse_verification_id(id)?;
        Ok(self.verifications.get_status(&id)?)
    }

    /// Issue a credential to `address`, authorized by the verification `verification_id`.
    pub async fn request_issuance(
        &self,
        verification_id: &str,
        address: &str,
        proof: &HolderProof,
    ) -> Result<CredentialRecord, PipelineError> {
        let address = LedgerAddress::parse(address)?;
        let verification_id = parse_verification_id(verification_id)?;
        self.signatures
            .verify(&address, &messages::issue(&address, &verification_id), proof)?;

        let verification = self.verifications.get_status(&verification_id)?;
        let result = match IssuanceGrant::authorize(&verification, &address, self.clock.now()) {
            Ok(grant) => {
                self.credentials
                    .request_issuance(grant)
                    .instrument(issuance_span(verification_id.as_str(), address.as_str()))
                    .await
            }
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(record) => record.status.as_str(),
            Err(BadgeError::AlreadyIssued { .. } | BadgeError::VerificationConsumed(_)) => {
                "conflict"
            }
            Err(BadgeError::Ledger(e)) if e.is_timeout() => "pending",
            Err(BadgeError::Ledger(_)) => "failed",
            Err(_) => "invalid",
        };
        self.metrics
            .issuance_total
            .with_label_values(&[outcome])
            .inc();
        Ok(result?)
    }

    /// The credential held by `address`, with the ledger's view applied.
    pub async fn badge_status(
        &self,
        address: &str,
    ) -> Result<Option<CredentialRecord>, PipelineError> {
        let address = LedgerAddress::parse(address)?;
        Ok(self.credentials.get_status(&address).await?)
    }

    pub async fn renew(
        &self,
        address: &str,
        proof: &HolderProof,
    ) -> Result<CredentialRecord, PipelineError> {
        let address = LedgerAddress::parse(address)?;
        self.signatures
            .verify(&address, &messages::renew(&address), proof)?;
        Ok(self.credentials.renew(&address).await?)
    }

    /// Cast a vote with the credential held by `address`.
    ///
    /// The nullifier is derived from the credential nonce and the proposal,
    /// so a second vote on the same proposal collides on the ledger while
    /// staying unlinkable to the address.
    pub async fn cast_vote(
        &self,
        address: &str,
        proposal_id: &str,
        choice: &str,
        proof: &HolderProof,
    ) -> Result<VoteReceipt, PipelineError> {
        let address = LedgerAddress::parse(address)?;
        validate_proposal_id(proposal_id)?;
        let choice = VoteChoice::from_str(choice)?;
        self.signatures
            .verify(&address, &messages::vote(&address, proposal_id, choice), proof)?;

        let result = self
            .submit_vote(&address, proposal_id, choice)
            .instrument(vote_span(proposal_id))
            .await;
        let outcome = match &result {
            Ok(_) => "accepted",
            Err(e) if e.reason == Some("already_voted") => "already_voted",
            Err(_) => "error",
        };
        self.metrics.votes_total.with_label_values(&[outcome]).inc();
        result
    }

    async fn submit_vote(
        &self,
        address: &LedgerAddress,
        proposal_id: &str,
        choice: VoteChoice,
    ) -> Result<VoteReceipt, PipelineError> {
        let credential = self
            .credentials
            .get_status(address)
            .await?
            .ok_or_else(|| PipelineError::not_found(format!("no credential for {address}")))?;
        let bridge = self.credentials.bridge();
        let height = bridge.current_height().await?;
        if !credential.can_vote(height) {
            let status = if credential.status == BadgeStatus::Active {
                BadgeStatus::Expired
            } else {
                credential.status
            };
            return Err(PipelineError::validation(format!(
                "credential is {status}, voting requires an active credential"
            )));
        }

        let nullifier = nullifier(proposal_id, &credential.nonce);
        if bridge.nullifier_spent(&nullifier).await? {
            return Err(PipelineError::already_voted());
        }
        let transaction_id = bridge.cast_vote(proposal_id, &nullifier, choice).await?;
        Ok(VoteReceipt {
            transaction_id,
            nullifier,
        })
    }

    pub async fn tally(&self, proposal_id: &str) -> Result<Tally, PipelineError> {
        validate_proposal_id(proposal_id)?;
        let bridge = self.credentials.bridge();
        Ok(Tally {
            yes: bridge.tally(proposal_id, VoteChoice::Yes).await?,
            no: bridge.tally(proposal_id, VoteChoice::No).await?,
            abstain: bridge.tally(proposal_id, VoteChoice::Abstain).await?,
        })
    }

    pub async fn health(&self) -> Health {
        match self.credentials.bridge().current_height().await {
            Ok(height) => {
                self.metrics
                    .ledger_height
                    .set(i64::try_from(height).unwrap_or(i64::MAX));
                Health {
                    ledger_height: Some(height),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "ledger unreachable during health check");
                Health {
                    ledger_height: None,
                }
            }
        }
    }
}

/// A malformed id cannot name a stored verification.
fn parse_verification_id(raw: &str) -> Result<VerificationId, PipelineError> {
    VerificationId::parse(raw)
        .map_err(|_| PipelineError::not_found(format!("verification {raw} not found")))
}

fn validate_proposal_id(proposal_id: &str) -> Result<(), PipelineError> {
    let valid = !proposal_id.is_empty()
        && proposal_id.len() <= MAX_PROPOSAL_ID_LEN
        && proposal_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PipelineError::validation(format!(
            "proposal id must be 1-{MAX_PROPOSAL_ID_LEN} characters of [A-Za-z0-9_-]"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_ids() {
        assert!(validate_proposal_id("prop-1_a").is_ok());
        assert!(validate_proposal_id("").is_err());
        assert!(validate_proposal_id("has:colon").is_err());
        assert!(validate_proposal_id(&"x".repeat(65)).is_err());
    }

    #[test]
    fn collaborators_build_http_adapters_or_report_config_errors() {
        let mut config = NodeConfig::default();
        config.providers.humanity_registry = Some("http://127.0.0.1:9/profiles".into());
        let deps = Collaborators::from_config(&config).unwrap();
        assert_eq!(deps.providers.len(), 1);
        assert_eq!(deps.providers[0].provider(), Provider::HumanityRegistry);

        config.providers.humanity_registry = Some("not a url".into());
        assert!(matches!(
            Collaborators::from_config(&config),
            Err(NodeError::Config(_))
        ));
    }

    #[test]
    fn tally_total_saturates() {
        let tally = Tally {
            yes: u64::MAX,
            no: 2,
            abstain: 1,
        };
        assert_eq!(tally.total(), u64::MAX);
        assert_eq!(Tally { yes: 1, no: 2, abstain: 3 }.total(), 6);
    }

    #[test]
    fn malformed_verification_id_reads_as_not_found() {
        let err = parse_verification_id("not-an-id!").unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::NotFound);
    }
}
