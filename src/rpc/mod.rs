//! RPC gateway for the handful of node calls the claimer needs
//!
//! The rest of the crate talks to the chain through [`RpcGateway`], which
//! keeps the learner and the submission pipeline testable against a fake
//! collaborator. [`SolanaRpcGateway`] is the production implementation on
//! top of the nonblocking [`RpcClient`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_account::Account;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_hash::Hash;
use solana_pubkey::Pubkey;
use solana_rpc_client_api::config::{
    RpcSendTransactionConfig, RpcSimulateTransactionConfig, RpcTransactionConfig,
};
use solana_signature::Signature;
use solana_transaction::Transaction;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, TransactionStatus, UiTransactionEncoding,
};

use crate::config::RpcConfig;
use crate::errors::ClaimerResult;

/// What simulation reported, reduced to what the pipeline acts on.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    /// Program error rendered as text, `None` on success
    pub err: Option<String>,
    /// Program log lines, empty when the node returned none
    pub logs: Vec<String>,
    pub units_consumed: Option<u64>,
}

/// The blockchain calls the claimer depends on.
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// Fetch a transaction by signature, byte-exact, at confirmed level.
    async fn transaction(
        &self,
        signature: &Signature,
    ) -> Result<EncodedConfirmedTransactionWithStatusMeta>;

    /// Fetch an account, `None` when it does not exist.
    async fn account(&self, address: &Pubkey) -> Result<Option<Account>>;

    async fn latest_blockhash(&self) -> Result<Hash>;

    /// Simulate with signature verification off and blockhash replacement on.
    async fn simulate(&self, transaction: &Transaction) -> Result<SimulationOutcome>;

    /// Send with preflight at the configured commitment and bounded retries.
    async fn send(&self, transaction: &Transaction) -> Result<Signature>;

    async fn signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<TransactionStatus>>>;
}

/// Production gateway over a Solana JSON-RPC node.
pub struct SolanaRpcGateway {
    client: RpcClient,
    commitment: CommitmentConfig,
    max_retries: usize,
}

impl SolanaRpcGateway {
    pub fn new(config: &RpcConfig, max_retries: usize) -> ClaimerResult<Self> {
        let commitment = config.commitment_config()?;
        let timeout = config.timeout_duration()?;
        let client =
            RpcClient::new_with_timeout_and_commitment(config.url.clone(), timeout, commitment);
        Ok(Self {
            client,
            commitment,
            max_retries,
        })
    }
}

#[async_trait]
impl RpcGateway for SolanaRpcGateway {
    async fn transaction(
        &self,
        signature: &Signature,
    ) -> Result<EncodedConfirmedTransactionWithStatusMeta> {
        // Base64 keeps the payload byte-exact; the reference transaction is
        // always read at confirmed, independent of the submission level.
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };
        self.client
            .get_transaction_with_config(signature, config)
            .await
            .with_context(|| format!("getTransaction {}", signature))
    }

    async fn account(&self, address: &Pubkey) -> Result<Option<Account>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .with_context(|| format!("getAccountInfo {}", address))?;
        Ok(response.value)
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .context("getLatestBlockhash")
    }

    async fn simulate(&self, transaction: &Transaction) -> Result<SimulationOutcome> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(self.commitment),
            ..RpcSimulateTransactionConfig::default()
        };
        let response = self
            .client
            .simulate_transaction_with_config(transaction, config)
            .await
            .context("simulateTransaction")?;
        let value = response.value;
        Ok(SimulationOutcome {
            err: value.err.map(|e| e.to_string()),
            logs: value.logs.unwrap_or_default(),
            units_consumed: value.units_consumed,
        })
    }

    async fn send(&self, transaction: &Transaction) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: false,
            preflight_commitment: Some(self.commitment.commitment),
            max_retries: Some(self.max_retries),
            ..RpcSendTransactionConfig::default()
        };
        self.client
            .send_transaction_with_config(transaction, config)
            .await
            .context("sendTransaction")
    }

    async fn signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<TransactionStatus>>> {
        let response = self
            .client
            .get_signature_statuses(signatures)
            .await
            .context("getSignatureStatuses")?;
        Ok(response.value)
    }
}

#[cfg(test)]
pub(crate) mod testing;
