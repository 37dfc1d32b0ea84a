//! Recording fake gateway used by the learner and pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use solana_account::Account;
use solana_hash::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, TransactionStatus};

use super::{RpcGateway, SimulationOutcome};

/// `EncodedConfirmedTransactionWithStatusMeta` is not `Clone` in this version of
/// `solana-transaction-status`, so duplicate it through its serde representation
/// (the value round-trips through JSON, yielding an equal copy).
pub(crate) fn clone_encoded(
    value: &EncodedConfirmedTransactionWithStatusMeta,
) -> EncodedConfirmedTransactionWithStatusMeta {
    let json = serde_json::to_string(value).expect("encoded transaction serializes");
    serde_json::from_str(&json).expect("encoded transaction deserializes")
}

/// Fake [`RpcGateway`] that records the order of calls made against it.
pub(crate) struct RecordingGateway {
    pub calls: Mutex<Vec<&'static str>>,
    pub transaction_response: Option<EncodedConfirmedTransactionWithStatusMeta>,
    pub accounts: HashMap<Pubkey, Account>,
    /// When set, every account lookup fails with this message.
    pub account_failure: Option<String>,
    pub blockhash: Hash,
    pub simulation: SimulationOutcome,
    pub send_signature: Signature,
    /// One response per poll; exhausted polls report no status.
    pub statuses: Mutex<VecDeque<Vec<Option<TransactionStatus>>>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            transaction_response: None,
            accounts: HashMap::new(),
            account_failure: None,
            blockhash: Hash::new_from_array([3u8; 32]),
            simulation: SimulationOutcome {
                err: None,
                logs: Vec::new(),
                units_consumed: Some(1),
            },
            send_signature: Signature::from([7u8; 64]),
            statuses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_transaction(mut self, response: EncodedConfirmedTransactionWithStatusMeta) -> Self {
        self.transaction_response = Some(response);
        self
    }

    pub fn with_account(mut self, address: Pubkey, account: Account) -> Self {
        self.accounts.insert(address, account);
        self
    }

    pub fn with_account_failure(mut self, message: &str) -> Self {
        self.account_failure = Some(message.to_string());
        self
    }

    pub fn with_simulation_error(mut self, reason: &str, logs: &[&str]) -> Self {
        self.simulation = SimulationOutcome {
            err: Some(reason.to_string()),
            logs: logs.iter().map(|s| s.to_string()).collect(),
            units_consumed: None,
        };
        self
    }

    pub fn with_status(self, status: TransactionStatus) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .push_back(vec![Some(status)]);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RpcGateway for RecordingGateway {
    async fn transaction(
        &self,
        _signature: &Signature,
    ) -> Result<EncodedConfirmedTransactionWithStatusMeta> {
        self.record("transaction");
        self.transaction_response
            .as_ref()
            .map(clone_encoded)
            .ok_or_else(|| anyhow!("no transaction configured"))
    }

    async fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        self.record("account");
        if let Some(message) = &self.account_failure {
            return Err(anyhow!("{}", message));
        }
        Ok(self.accounts.get(address).cloned())
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        self.record("latest_blockhash");
        Ok(self.blockhash)
    }

    async fn simulate(&self, _transaction: &Transaction) -> Result<SimulationOutcome> {
        self.record("simulate");
        Ok(self.simulation.clone())
    }

    async fn send(&self, _transaction: &Transaction) -> Result<Signature> {
        self.record("send");
        Ok(self.send_signature)
    }

    async fn signature_statuses(
        &self,
        _signatures: &[Signature],
    ) -> Result<Vec<Option<TransactionStatus>>> {
        self.record("signature_statuses");
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| vec![None]))
    }
}
