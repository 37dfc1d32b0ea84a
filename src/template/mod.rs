//! Template learning from a reference transaction
//!
//! The learner runs once at startup. It downloads the reference
//! transaction, resolves any address-table lookups, and captures the claim
//! instruction (program id, raw payload, resolved account metas) plus two
//! side-channel facts: which token program variant is in use and which
//! mint the reward pays out in.

pub mod lookup;

use std::collections::HashMap;
use std::str::FromStr;

use log::debug;
use solana_address_lookup_table_interface::state::AddressLookupTable;
use solana_instruction::AccountMeta;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction_status::{UiInnerInstructions, UiInstruction, UiTransactionTokenBalance};

use crate::constants;
use crate::errors::{ClaimerError, ClaimerResult};
use crate::rpc::RpcGateway;

use self::lookup::ResolvedAccount;

/// Everything learned from the reference transaction, published once to
/// the builder and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ReferenceTemplate {
    /// The claim program the captured instruction targets
    pub program_id: Pubkey,
    /// Raw instruction payload, replayed byte-for-byte
    pub data: Vec<u8>,
    /// Resolved account metas in instruction order
    pub accounts: Vec<AccountMeta>,
    /// Token program variant observed in the reference transaction
    pub token_program: Option<Pubkey>,
    /// Mint the reward is paid in, when it could be inferred
    pub reward_mint: Option<Pubkey>,
}

/// Learn a replay template from a historical transaction signature.
pub async fn learn_reference_template(
    gateway: &dyn RpcGateway,
    reference_signature: &str,
    program_id: &Pubkey,
    token_program_override: Option<Pubkey>,
) -> ClaimerResult<ReferenceTemplate> {
    let signature = Signature::from_str(reference_signature.trim())
        .map_err(|_| ClaimerError::InvalidSignature(reference_signature.to_string()))?;

    let fetched = gateway
        .transaction(&signature)
        .await
        .map_err(|e| ClaimerError::rpc("getTransaction", e))?;
    let meta = fetched.transaction.meta;
    let decoded = fetched
        .transaction
        .transaction
        .decode()
        .ok_or(ClaimerError::UndecodableTransaction)?;
    let message = decoded.message;

    // Tables must be resolved before any instruction is interpreted;
    // account indices are meaningless against the static keys alone.
    let mut tables: HashMap<Pubkey, Vec<Pubkey>> = HashMap::new();
    for table_key in lookup::referenced_tables(&message) {
        let account = gateway
            .account(&table_key)
            .await
            .map_err(|e| ClaimerError::rpc("getAccountInfo", e))?
            .ok_or(ClaimerError::LookupTableMissing(table_key))?;
        let table = AddressLookupTable::deserialize(&account.data)
            .map_err(|_| ClaimerError::LookupTableDecode(table_key))?;
        tables.insert(table_key, table.addresses.to_vec());
    }
    let resolved = lookup::resolve_account_keys(&message, &tables)?;
    debug!(
        "resolved {} account keys from {} lookup tables",
        resolved.len(),
        tables.len()
    );

    let mut accounts: Vec<AccountMeta> = Vec::new();
    let mut data: Vec<u8> = Vec::new();
    let mut token_program: Option<Pubkey> = None;

    for instruction in message.instructions() {
        let program = resolved_key(&resolved, instruction.program_id_index)?.pubkey;
        if program == *program_id {
            let mut metas = Vec::with_capacity(instruction.accounts.len());
            for &account_index in &instruction.accounts {
                let entry = resolved_key(&resolved, account_index)?;
                metas.push(AccountMeta {
                    pubkey: entry.pubkey,
                    is_signer: entry.is_signer,
                    is_writable: entry.is_writable,
                });
            }
            accounts = metas;
            data = instruction.data.clone();
        }
        if constants::is_token_program(&program) {
            token_program = Some(program);
        }
    }

    // Token program not visible at the top level: scan inner instructions,
    // and take the mint from the first account the token instruction touches.
    let mut reward_mint: Option<Pubkey> = None;
    if token_program.is_none() {
        if let Some(meta) = &meta {
            let inner: Option<Vec<UiInnerInstructions>> = meta.inner_instructions.clone().into();
            for set in inner.unwrap_or_default() {
                for instruction in &set.instructions {
                    let compiled = match instruction {
                        UiInstruction::Compiled(compiled) => compiled,
                        UiInstruction::Parsed(_) => continue,
                    };
                    let program = match resolved.get(compiled.program_id_index as usize) {
                        Some(entry) => entry.pubkey,
                        None => continue,
                    };
                    if constants::is_token_program(&program) {
                        token_program = Some(program);
                        if let Some(&first) = compiled.accounts.first() {
                            reward_mint = resolved.get(first as usize).map(|entry| entry.pubkey);
                        }
                    }
                }
            }
        }
    }

    // Last resort for the mint: post-execution token balance metadata.
    if reward_mint.is_none() {
        if let Some(meta) = &meta {
            let balances: Option<Vec<UiTransactionTokenBalance>> =
                meta.post_token_balances.clone().into();
            if let Some(first) = balances.unwrap_or_default().first() {
                reward_mint = Pubkey::from_str(&first.mint).ok();
            }
        }
    }

    if accounts.is_empty() || data.is_empty() {
        return Err(ClaimerError::TemplateNotFound(*program_id));
    }
    let token_program = token_program.or(token_program_override);
    if token_program.is_none() {
        return Err(ClaimerError::TokenProgramUnknown);
    }

    Ok(ReferenceTemplate {
        program_id: *program_id,
        data,
        accounts,
        token_program,
        reward_mint,
    })
}

fn resolved_key(resolved: &[ResolvedAccount], index: u8) -> ClaimerResult<&ResolvedAccount> {
    resolved
        .get(index as usize)
        .ok_or(ClaimerError::AccountIndexOutOfRange {
            index: index as usize,
            len: resolved.len(),
        })
}
