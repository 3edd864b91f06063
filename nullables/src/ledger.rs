//! Nullable ledger: an in-memory stand-in for the ledger program.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use attest_ledger::program;
use attest_ledger::{LedgerClient, LedgerError, RejectReason, TransactionId, Transition};
use attest_types::VoteChoice;

/// A failure to inject into the next submission.
#[derive(Clone, Debug)]
pub enum LedgerFault {
    /// The program refuses the transition with this message.
    Reject(String),
    /// The node cannot be reached.
    Unreachable,
    /// The call never returns; the bridge timeout has to fire.
    Stall,
}

/// An in-memory ledger that behaves like the credential/vote program.
///
/// - `issue_credential` records `credentials[address] = expiry`
/// - `cast_vote` refuses a known nullifier, otherwise records it and bumps
///   `tallies["{proposal}:{choice}"]`
///
/// Faults can be queued per submission, and the whole node can be taken
/// offline.
pub struct NullLedger {
    height: AtomicU64,
    offline: AtomicBool,
    mappings: Mutex<HashMap<(String, String), String>>,
    submitted: Mutex<Vec<Transition>>,
    faults: Mutex<VecDeque<LedgerFault>>,
    tx_counter: AtomicU64,
}

impl NullLedger {
    pub fn new(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
            offline: AtomicBool::new(false),
            mappings: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            faults: Mutex::new(VecDeque::new()),
            tx_counter: AtomicU64::new(0),
        }
    }

    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::SeqCst);
    }

    pub fn advance_height(&self, blocks: u64) {
        self.height.fetch_add(blocks, Ordering::SeqCst);
    }

    /// Take every call offline (or bring it back).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Queue a fault for the next submission.
    pub fn fail_next(&self, fault: LedgerFault) {
        self.faults.lock().unwrap().push_back(fault);
    }

    /// Mark a credential as revoked by the program.
    pub fn revoke(&self, address: &str) {
        self.insert_mapping(program::REVOCATIONS, address, "true");
    }

    pub fn insert_mapping(&self, mapping: &str, key: &str, value: &str) {
        self.mappings
            .lock()
            .unwrap()
            .insert((mapping.to_string(), key.to_string()), value.to_string());
    }

    pub fn mapping(&self, mapping: &str, key: &str) -> Option<String> {
        self.mappings
            .lock()
            .unwrap()
            .get(&(mapping.to_string(), key.to_string()))
            .cloned()
    }

    /// Every transition accepted so far, in order.
    pub fn submitted(&self) -> Vec<Transition> {
        self.submitted.lock().unwrap().clone()
    }

    fn check_online(&self) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(LedgerError::Unreachable("null ledger offline".into()))
        } else {
            Ok(())
        }
    }

    fn apply(&self, transition: &Transition) -> Result<(), LedgerError> {
        let mut mappings = self.mappings.lock().unwrap();
        match transition.function.as_str() {
            program::ISSUE_CREDENTIAL => {
                let [address, _proof_hash, expiry] = transition.inputs.as_slice() else {
                    return Err(LedgerError::Rejected(RejectReason::Other(
                        "issue_credential expects 3 inputs".into(),
                    )));
                };
                mappings.insert(
                    (program::CREDENTIALS.to_string(), address.clone()),
                    format!("{expiry}u32"),
                );
            }
            program::CAST_VOTE => {
                let [proposal, nullifier, choice] = transition.inputs.as_slice() else {
                    return Err(LedgerError::Rejected(RejectReason::Other(
                        "cast_vote expects 3 inputs".into(),
                    )));
                };
                let nf_key = (program::NULLIFIERS.to_string(), nullifier.clone());
                if mappings.contains_key(&nf_key) {
                    return Err(LedgerError::Rejected(RejectReason::classify(
                        "nullifier already exists",
                    )));
                }
                let choice = VoteChoice::ALL
                    .into_iter()
                    .find(|c| c.as_u8().to_string() == *choice)
                    .ok_or_else(|| {
                        LedgerError::Rejected(RejectReason::Other(format!("bad choice {choice}")))
                    })?;
                mappings.insert(nf_key, "true".to_string());
                let tally_key = (
                    program::TALLIES.to_string(),
                    program::tally_key(proposal, choice),
                );
                let count = mappings
                    .get(&tally_key)
                    .and_then(|v| program::parse_u64(v))
                    .unwrap_or(0);
                mappings.insert(tally_key, format!("{}u64", count + 1));
            }
            other => {
                return Err(LedgerError::Rejected(RejectReason::Other(format!(
                    "unknown function {other}"
                ))))
            }
        }
        Ok(())
    }
}

impl Default for NullLedger {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl LedgerClient for NullLedger {
    async fn submit(&self, transition: Transition) -> Result<TransactionId, LedgerError> {
        self.check_online()?;
        let fault = self.faults.lock().unwrap().pop_front();
        match fault {
            Some(LedgerFault::Reject(msg)) => {
                return Err(LedgerError::Rejected(RejectReason::classify(&msg)))
            }
            Some(LedgerFault::Unreachable) => {
                return Err(LedgerError::Unreachable("injected fault".into()))
            }
            Some(LedgerFault::Stall) => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
            }
            None => {}
        }

        self.apply(&transition)?;
        self.submitted.lock().unwrap().push(transition);
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TransactionId::new(format!("at1null{n:06}")))
    }

    async fn read_mapping(
        &self,
        _program: &str,
        mapping: &str,
        key: &str,
    ) -> Result<Option<String>, LedgerError> {
        self.check_online()?;
        Ok(self.mapping(mapping, key))
    }

    async fn current_height(&self) -> Result<u64, LedgerError> {
        self.check_online()?;
        Ok(self.height.load(Ordering::SeqCst))
    }
}
