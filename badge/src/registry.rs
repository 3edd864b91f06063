//! The credential registry.

use std::sync::Arc;

use attest_crypto::{new_badge_id, nonce, EntropySource};
use attest_ledger::LedgerBridge;
use attest_store::{KeyedLocks, KeyedStore, ShardedStore};
use attest_types::{BadgeId, BadgeStatus, Clock, IssuanceParams, LedgerAddress, VerificationId};

use crate::{BadgeError, CredentialRecord, IssuanceGrant};

/// Outcome of the atomic claim step.
enum Claim {
    Claimed(CredentialRecord),
    /// A pending record outlived the pending timeout and must be reconciled
    /// against the ledger before the address can be claimed.
    Stale(CredentialRecord),
}

/// Keyed store of credentials, one current record per address.
///
/// `by_verification` records which credential each verification authorized.
/// Both stores are only written under the address lock; a verification and
/// the credential it authorizes always share an address, so one lock covers
/// both entries.
pub struct CredentialRegistry {
    records: Arc<dyn KeyedStore<LedgerAddress, CredentialRecord>>,
    by_verification: Arc<dyn KeyedStore<VerificationId, BadgeId>>,
    locks: KeyedLocks,
    bridge: LedgerBridge,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
    params: IssuanceParams,
}

impl CredentialRegistry {
    pub fn new(
        bridge: LedgerBridge,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
        params: IssuanceParams,
    ) -> Self {
        Self {
            records: Arc::new(ShardedStore::new()),
            by_verification: Arc::new(ShardedStore::new()),
            locks: KeyedLocks::new(),
            bridge,
            clock,
            entropy,
            params,
        }
    }

    /// Swap in other backing stores.
    pub fn with_stores(
        mut self,
        records: Arc<dyn KeyedStore<LedgerAddress, CredentialRecord>>,
        by_verification: Arc<dyn KeyedStore<VerificationId, BadgeId>>,
    ) -> Self {
        self.records = records;
        self.by_verification = by_verification;
        self
    }

    pub fn bridge(&self) -> &LedgerBridge {
        &self.bridge
    }

    pub fn params(&self) -> &IssuanceParams {
        &self.params
    }

    /// Issue a credential for an authorized address.
    ///
    /// Claims the address by writing a `pending` record, then submits the
    /// issuance to the ledger. Confirmation flips the record to `active`; a
    /// rejection or an unreachable ledger flips it to `failed` and releases
    /// the address. A timeout leaves it `pending` for later reconciliation,
    /// since the transaction may still land.
    pub async fn request_issuance(
        &self,
        grant: IssuanceGrant,
    ) -> Result<CredentialRecord, BadgeError> {
        let pending = self.claim(&grant).await?;
        tracing::info!(
            badge_id = %pending.id,
            address = %pending.address,
            expires_at_height = pending.expires_at_height,
            "credential claimed"
        );

        match self
            .bridge
            .issue_credential(&pending.address, &pending.proof_hash, pending.expires_at_height)
            .await
        {
            Ok(tx) => {
                let mut active = pending.with_status(BadgeStatus::Active);
                active.transaction_id = Some(tx);
                let confirmed = self.transition(&pending, active)?;
                tracing::info!(badge_id = %confirmed.id, status = %confirmed.status, "credential confirmed");
                Ok(confirmed)
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(badge_id = %pending.id, "issuance unconfirmed, left pending");
                Err(e.into())
            }
            Err(e) => {
                self.transition(&pending, pending.with_status(BadgeStatus::Failed))?;
                tracing::warn!(badge_id = %pending.id, error = %e, "credential issuance failed");
                Err(e.into())
            }
        }
    }

    /// Claim the uniqueness slot for `grant.address`, reconciling a stale
    /// pending record at most once.
    async fn claim(&self, grant: &IssuanceGrant) -> Result<CredentialRecord, BadgeError> {
        for _ in 0..2 {
            let height = self.bridge.current_height().await?;
            let candidate = CredentialRecord {
                id: new_badge_id(self.entropy.as_ref())?,
                address: grant.address.clone(),
                issuer: self.params.issuer.clone(),
                verification_id: grant.verification_id.clone(),
                proof_hash: grant.proof_hash,
                nonce: nonce(self.entropy.as_ref())?,
                created_at: self.clock.now(),
                expires_at_height: height.saturating_add(self.params.badge_validity_blocks),
                status: BadgeStatus::Pending,
                transaction_id: None,
            };

            let claim = self
                .locks
                .with_lock(&grant.address, || self.try_claim(candidate, height))??;
            match claim {
                Claim::Claimed(record) => return Ok(record),
                Claim::Stale(stale) => {
                    self.reconcile(&stale).await?;
                }
            }
        }
        let status = self
            .records
            .get(&grant.address)?
            .map_or(BadgeStatus::Pending, |r| r.status);
        Err(BadgeError::AlreadyIssued {
            address: grant.address.to_string(),
            status,
        })
    }

    /// The check-then-insert critical section. Runs under the address lock.
    fn try_claim(&self, candidate: CredentialRecord, height: u64) -> Result<Claim, BadgeError> {
        let now = self.clock.now();
        if let Some(existing) = self.records.get(&candidate.address)? {
            match existing.status {
                BadgeStatus::Pending
                    if existing.is_stale_pending(now, self.params.pending_timeout_secs) =>
                {
                    return Ok(Claim::Stale(existing));
                }
                BadgeStatus::Active if existing.is_past_expiry(height) => {}
                BadgeStatus::Pending | BadgeStatus::Active => {
                    return Err(BadgeError::AlreadyIssued {
                        address: existing.address.to_string(),
                        status: existing.status,
                    });
                }
                BadgeStatus::Revoked => {
                    return Err(BadgeError::Revoked(existing.address.to_string()));
                }
                BadgeStatus::Failed | BadgeStatus::Expired => {}
            }
        }

        if self
            .by_verification
            .insert_if_absent(candidate.verification_id.clone(), candidate.id.clone())?
            .is_some()
        {
            return Err(BadgeError::VerificationConsumed(
                candidate.verification_id.to_string(),
            ));
        }
        self.records
            .put(candidate.address.clone(), candidate.clone())?;
        Ok(Claim::Claimed(candidate))
    }

    /// Replace `expected` with `next` if nobody changed it in between, and
    /// release the verification when `next` gives the slot up as failed.
    ///
    /// Returns the record now stored for the address.
    fn transition(
        &self,
        expected: &CredentialRecord,
        next: CredentialRecord,
    ) -> Result<CredentialRecord, BadgeError> {
        self.locks.with_lock(&expected.address, || -> Result<CredentialRecord, BadgeError> {
            let release = next.status == BadgeStatus::Failed;
            if self
                .records
                .compare_and_swap(expected.address.clone(), Some(expected), next.clone())?
            {
                if release {
                    self.by_verification.remove(&expected.verification_id)?;
                }
                return Ok(next);
            }
            self.records
                .get(&expected.address)?
                .ok_or_else(|| BadgeError::NotFound(expected.address.to_string()))
        })?
    }

    /// Settle a stale pending record against the ledger. It becomes `active`
    /// only if the ledger holds a credential with this record's expiry
    /// height; an absent or older entry means the submission never landed.
    async fn reconcile(&self, stale: &CredentialRecord) -> Result<CredentialRecord, BadgeError> {
        let on_ledger = self.bridge.credential_expiry(&stale.address).await?;
        let status = if on_ledger == Some(stale.expires_at_height) {
            BadgeStatus::Active
        } else {
            BadgeStatus::Failed
        };
        let settled = self.transition(stale, stale.with_status(status))?;
        tracing::info!(badge_id = %stale.id, status = %settled.status, "stale pending credential reconciled");
        Ok(settled)
    }

    /// Current credential for `address`, with the ledger's view applied.
    ///
    /// A stale pending record is reconciled, an active record past its expiry
    /// height reads as `expired`, and a ledger revocation reads as `revoked`.
    pub async fn get_status(
        &self,
        address: &LedgerAddress,
    ) -> Result<Option<CredentialRecord>, BadgeError> {
        let Some(mut record) = self.records.get(address)? else {
            return Ok(None);
        };

        if record.is_stale_pending(self.clock.now(), self.params.pending_timeout_secs) {
            record = self.reconcile(&record).await?;
        }

        if record.status == BadgeStatus::Active {
            let height = self.bridge.current_height().await?;
            if record.is_past_expiry(height) {
                record = self.transition(&record, record.with_status(BadgeStatus::Expired))?;
            } else if self.bridge.is_revoked(address).await? {
                record = self.transition(&record, record.with_status(BadgeStatus::Revoked))?;
                tracing::warn!(badge_id = %record.id, "credential revoked on ledger");
            }
        }
        Ok(Some(record))
    }

    /// Extend an active or expired credential by a full validity period from
    /// the current ledger height. The nonce is kept.
    pub async fn renew(&self, address: &LedgerAddress) -> Result<CredentialRecord, BadgeError> {
        let height = self.bridge.current_height().await?;
        let validity = self.params.badge_validity_blocks;
        let renewed = self.locks.with_lock(address, || -> Result<CredentialRecord, BadgeError> {
            let Some(existing) = self.records.get(address)? else {
                return Err(BadgeError::NotFound(address.to_string()));
            };
            match existing.status {
                BadgeStatus::Revoked => Err(BadgeError::Revoked(address.to_string())),
                BadgeStatus::Pending => Err(BadgeError::AlreadyIssued {
                    address: address.to_string(),
                    status: existing.status,
                }),
                BadgeStatus::Failed => Err(BadgeError::NotRenewable(existing.status)),
                BadgeStatus::Active | BadgeStatus::Expired => {
                    let mut next = existing.with_status(BadgeStatus::Active);
                    next.expires_at_height = height.saturating_add(validity);
                    self.records.put(address.clone(), next.clone())?;
                    Ok(next)
                }
            }
        })??;
        tracing::info!(
            badge_id = %renewed.id,
            expires_at_height = renewed.expires_at_height,
            "credential renewed"
        );
        Ok(renewed)
    }

    /// Administrative revocation. Terminal.
    pub fn revoke(&self, address: &LedgerAddress) -> Result<CredentialRecord, BadgeError> {
        let revoked = self.locks.with_lock(address, || -> Result<CredentialRecord, BadgeError> {
            let Some(existing) = self.records.get(address)? else {
                return Err(BadgeError::NotFound(address.to_string()));
            };
            let next = existing.with_status(BadgeStatus::Revoked);
            self.records.put(address.clone(), next.clone())?;
            Ok(next)
        })??;
        tracing::warn!(badge_id = %revoked.id, "credential revoked");
        Ok(revoked)
    }

    /// Raw stored record, without consulting the ledger.
    pub fn get(&self, address: &LedgerAddress) -> Result<Option<CredentialRecord>, BadgeError> {
        Ok(self.records.get(address)?)
    }
}
