//! The verification registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use attest_crypto::{new_verification_id, proof_hash, EntropySource};
use attest_store::{KeyedLocks, KeyedStore, ShardedStore};
use attest_types::{Clock, LedgerAddress, Provider, VerificationId, VerificationStatus};

use crate::provider::{IdentityProvider, ProfileReference};
use crate::{VerificationError, VerificationRecord};

/// Default bound on a provider check.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of [`VerificationRegistry::submit`].
#[derive(Clone, Debug)]
pub struct SubmitOutcome {
    pub record: VerificationRecord,
    /// True when an existing live verification was returned instead of a new one.
    pub reused: bool,
}

/// Keyed store of verification attempts.
///
/// Records live in a primary store keyed by id. A secondary index maps each
/// address to its current live verified record and is only written under the
/// address lock, together with the record it points to.
pub struct VerificationRegistry {
    records: Arc<dyn KeyedStore<VerificationId, VerificationRecord>>,
    by_address: Arc<dyn KeyedStore<LedgerAddress, VerificationId>>,
    locks: KeyedLocks,
    providers: HashMap<Provider, Arc<dyn IdentityProvider>>,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
    ttl_secs: u64,
    provider_timeout: Duration,
}

impl VerificationRegistry {
    pub fn new(clock: Arc<dyn Clock>, entropy: Arc<dyn EntropySource>, ttl_secs: u64) -> Self {
        Self {
            records: Arc::new(ShardedStore::new()),
            by_address: Arc::new(ShardedStore::new()),
            locks: KeyedLocks::new(),
            providers: HashMap::new(),
            clock,
            entropy,
            ttl_secs,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Swap in other backing stores.
    pub fn with_stores(
        mut self,
        records: Arc<dyn KeyedStore<VerificationId, VerificationRecord>>,
        by_address: Arc<dyn KeyedStore<LedgerAddress, VerificationId>>,
    ) -> Self {
        self.records = records;
        self.by_address = by_address;
        self
    }

    /// Register the adapter for the provider it reports.
    pub fn with_provider(mut self, adapter: Arc<dyn IdentityProvider>) -> Self {
        self.providers.insert(adapter.provider(), adapter);
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn has_provider(&self, provider: Provider) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Submit an identity claim for `address`.
    ///
    /// Returns the existing live verification unchanged when there is one.
    /// Otherwise checks the claim with the provider and stores a new record.
    /// When concurrent submissions race, the first verified write wins and
    /// the others return the winner's record.
    pub async fn submit(
        &self,
        provider: Provider,
        address: LedgerAddress,
        payload: serde_json::Value,
    ) -> Result<SubmitOutcome, VerificationError> {
        if let Some(record) = self.live_for(&address)? {
            tracing::debug!(verification_id = %record.id, address = %address, "reusing live verification");
            return Ok(SubmitOutcome {
                record,
                reused: true,
            });
        }

        let adapter = self
            .providers
            .get(&provider)
            .ok_or(VerificationError::ProviderNotConfigured(provider))?;
        let profile = ProfileReference::from_payload(&payload)?;

        let check = tokio::time::timeout(self.provider_timeout, adapter.verify(&profile))
            .await
            .map_err(|_| VerificationError::ProviderTimeout(provider))??;

        let now = self.clock.now();
        let status = if check.registered {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Rejected
        };
        let record = VerificationRecord {
            id: new_verification_id(self.entropy.as_ref())?,
            address: address.clone(),
            provider,
            status,
            proof_hash: proof_hash(
                provider,
                &address,
                &check.datum,
                check.submission_time.unwrap_or(now),
            ),
            created_at: now,
            expires_at: now.plus_secs(self.ttl_secs),
            provider_data: payload,
        };

        let outcome = self.locks.with_lock(&address, || -> Result<SubmitOutcome, VerificationError> {
            if let Some(winner) = self.live_for(&address)? {
                return Ok(SubmitOutcome {
                    record: winner,
                    reused: true,
                });
            }
            self.records.put(record.id.clone(), record.clone())?;
            if record.status == VerificationStatus::Verified {
                self.by_address.put(address.clone(), record.id.clone())?;
            }
            Ok(SubmitOutcome {
                record,
                reused: false,
            })
        })??;

        if !outcome.reused {
            tracing::info!(
                verification_id = %outcome.record.id,
                provider = %provider,
                status = %outcome.record.status,
                "verification recorded"
            );
        }
        Ok(outcome)
    }

    /// Look up a verification, flipping it to `expired` if read past its expiry.
    pub fn get_status(&self, id: &VerificationId) -> Result<VerificationRecord, VerificationError> {
        let record = self
            .records
            .get(id)?
            .ok_or_else(|| VerificationError::NotFound(id.to_string()))?;
        if !record.is_stale(self.clock.now()) {
            return Ok(record);
        }

        self.locks.with_lock(&record.address, || -> Result<VerificationRecord, VerificationError> {
            let Some(mut current) = self.records.get(id)? else {
                return Err(VerificationError::NotFound(id.to_string()));
            };
            if current.is_stale(self.clock.now()) {
                current.status = VerificationStatus::Expired;
                self.records.put(id.clone(), current.clone())?;
                if self.by_address.get(&current.address)?.as_ref() == Some(id) {
                    self.by_address.remove(&current.address)?;
                }
                tracing::debug!(verification_id = %id, "verification expired");
            }
            Ok(current)
        })?
    }

    /// The live verified record for `address`, if any.
    pub fn live_for(
        &self,
        address: &LedgerAddress,
    ) -> Result<Option<VerificationRecord>, VerificationError> {
        let Some(id) = self.by_address.get(address)? else {
            return Ok(None);
        };
        let now = self.clock.now();
        Ok(self.records.get(&id)?.filter(|r| r.is_live(now)))
    }

    pub fn len(&self) -> Result<usize, VerificationError> {
        Ok(self.records.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, VerificationError> {
        Ok(self.records.is_empty()?)
    }
}
