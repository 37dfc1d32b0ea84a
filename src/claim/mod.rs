//! Claim transaction building and submission
//!
//! Each attempt rebuilds the transaction from the learned template: fee
//! instructions first, then the optional holding-account provisioning,
//! then the replayed claim instruction byte-for-byte. The assembled
//! transaction is always simulated before anything is sent.


use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_instruction::{AccountMeta, Instruction};
use solana_keypair::Keypair;
use solana_message::Message;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::Transaction;
use solana_transaction_status::TransactionConfirmationStatus;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::FeesConfig;
use crate::constants::ASSOCIATED_TOKEN_PROGRAM_ID;
use crate::errors::{ClaimerError, ClaimerResult};
use crate::rpc::RpcGateway;
use crate::template::ReferenceTemplate;

/// How long a submitted signature is polled before the attempt settles
/// for a pending result.
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Whether an attempt stops after simulation or goes on to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimMode {
    SimulateOnly,
    SendAndConfirm,
}

/// Outcome of one claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Simulation passed and the attempt was configured not to send
    SimulatedOk,
    /// Sent and confirmed within the poll window
    Submitted(Signature),
    /// Sent but not confirmed within the poll window; it may still land
    SubmittedPending(Signature),
}

impl std::fmt::Display for ClaimOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimOutcome::SimulatedOk => write!(f, "simulation OK"),
            ClaimOutcome::Submitted(signature) => write!(f, "submitted: {}", signature),
            ClaimOutcome::SubmittedPending(signature) => {
                write!(f, "submitted (pending): {}", signature)
            }
        }
    }
}

/// Derive the deterministic reward holding account for an owner and mint.
pub fn holding_account_address(owner: &Pubkey, token_program: &Pubkey, mint: &Pubkey) -> Pubkey {
    let (address, _bump) = Pubkey::find_program_address(
        &[owner.as_ref(), token_program.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    );
    address
}

/// Instruction that creates the holding account. Idempotence is handled by
/// the caller's existence pre-check, not by the instruction itself.
pub fn create_holding_account_instruction(
    payer: &Pubkey,
    holding_account: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: *ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*holding_account, false),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(solana_sdk_ids::system_program::id(), false),
            AccountMeta::new_readonly(*token_program, false),
        ],
        data: Vec::new(),
    }
}

/// Assemble the instruction sequence for one attempt. Order is fixed:
/// compute-unit limit, priority price, provisioning, then the replayed
/// claim instruction with program id, accounts and payload copied from
/// the template untouched.
pub fn build_claim_instructions(
    template: &ReferenceTemplate,
    wallet: &Pubkey,
    fees: &FeesConfig,
    provision: bool,
) -> Vec<Instruction> {
    let mut instructions = Vec::new();

    if let Some(limit) = fees.compute_unit_limit {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(limit));
    }
    if let Some(price) = fees.priority_microlamports {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(price));
    }

    if provision {
        if let (Some(token_program), Some(mint)) = (template.token_program, template.reward_mint) {
            let holding = holding_account_address(wallet, &token_program, &mint);
            instructions.push(create_holding_account_instruction(
                wallet,
                &holding,
                wallet,
                &mint,
                &token_program,
            ));
        }
    }

    instructions.push(Instruction {
        program_id: template.program_id,
        accounts: template.accounts.clone(),
        data: template.data.clone(),
    });

    instructions
}

/// Pick a keypair for every signer the message requires.
///
/// The map only ever holds the one configured wallet; anything else the
/// message asks for is a hard error because this system supports exactly
/// one signer.
fn resolve_signers<'a>(
    message: &Message,
    signing_keys: &HashMap<Pubkey, &'a Keypair>,
) -> ClaimerResult<Vec<&'a Keypair>> {
    let required = message.header.num_required_signatures as usize;
    let mut signers = Vec::with_capacity(required);
    for key in message.account_keys.iter().take(required) {
        match signing_keys.get(key) {
            Some(keypair) => signers.push(*keypair),
            None => return Err(ClaimerError::NoMatchingSigner(*key)),
        }
    }
    Ok(signers)
}

/// Builds, signs, simulates and submits claim transactions from the
/// template learned at startup.
pub struct Claimer {
    gateway: Arc<dyn RpcGateway>,
    template: ReferenceTemplate,
    wallet: Keypair,
    fees: FeesConfig,
}

impl Claimer {
    pub fn new(
        gateway: Arc<dyn RpcGateway>,
        template: ReferenceTemplate,
        wallet: Keypair,
        fees: FeesConfig,
    ) -> Self {
        Self {
            gateway,
            template,
            wallet,
            fees,
        }
    }

    /// Whether the reward holding account needs to be created first.
    ///
    /// A failed lookup counts as "absent": a missing account is the
    /// expected steady state and simulation rejects a wrong guess.
    async fn needs_provisioning(&self) -> bool {
        let (token_program, mint) = match (self.template.token_program, self.template.reward_mint) {
            (Some(token_program), Some(mint)) => (token_program, mint),
            _ => return false,
        };
        let holding = holding_account_address(&self.wallet.pubkey(), &token_program, &mint);
        match self.gateway.account(&holding).await {
            Ok(Some(account)) => account.lamports == 0,
            Ok(None) => true,
            Err(e) => {
                warn!("holding account lookup failed, assuming absent: {:#}", e);
                true
            }
        }
    }

    /// Run one claim attempt end to end.
    ///
    /// The shutdown channel is only consulted between confirmation polls;
    /// an in-flight network call is never interrupted.
    pub async fn attempt(
        &self,
        mode: ClaimMode,
        mut shutdown: watch::Receiver<bool>,
    ) -> ClaimerResult<ClaimOutcome> {
        let payer = self.wallet.pubkey();
        let provision = self.needs_provisioning().await;
        let instructions = build_claim_instructions(&self.template, &payer, &self.fees, provision);

        let blockhash = self
            .gateway
            .latest_blockhash()
            .await
            .map_err(|e| ClaimerError::rpc("getLatestBlockhash", e))?;

        let message = Message::new_with_blockhash(&instructions, Some(&payer), &blockhash);
        let mut signing_keys: HashMap<Pubkey, &Keypair> = HashMap::new();
        signing_keys.insert(payer, &self.wallet);
        let signers = resolve_signers(&message, &signing_keys)?;

        let mut transaction = Transaction::new_unsigned(message);
        transaction
            .try_sign(&signers, blockhash)
            .map_err(|e| ClaimerError::Signing(e.to_string()))?;

        // Simulation always runs before send; a failure here is final for
        // this attempt.
        let simulation = self
            .gateway
            .simulate(&transaction)
            .await
            .map_err(|e| ClaimerError::rpc("simulateTransaction", e))?;
        if let Some(reason) = simulation.err {
            return Err(ClaimerError::SimulationFailed {
                reason,
                logs: simulation.logs,
            });
        }
        debug!(
            "simulation passed, {} compute units",
            simulation.units_consumed.unwrap_or(0)
        );

        if mode == ClaimMode::SimulateOnly {
            return Ok(ClaimOutcome::SimulatedOk);
        }

        let signature = self
            .gateway
            .send(&transaction)
            .await
            .map_err(|e| ClaimerError::rpc("sendTransaction", e))?;

        let deadline = Instant::now() + CONFIRM_TIMEOUT;
        while Instant::now() < deadline {
            if let Ok(statuses) = self.gateway.signature_statuses(&[signature]).await {
                if let Some(Some(status)) = statuses.first() {
                    match status.confirmation_status {
                        Some(TransactionConfirmationStatus::Confirmed)
                        | Some(TransactionConfirmationStatus::Finalized) => {
                            return Ok(ClaimOutcome::Submitted(signature));
                        }
                        _ => {}
                    }
                }
            }
            tokio::select! {
                _ = shutdown.changed() => return Ok(ClaimOutcome::SubmittedPending(signature)),
                _ = tokio::time::sleep(CONFIRM_POLL_INTERVAL) => {}
            }
        }

        // Not confirmed inside the window; the transaction may still land.
        Ok(ClaimOutcome::SubmittedPending(signature))
    }
}
