//! Address lookup table resolution
//!
//! Instruction account indices in a versioned message are only meaningful
//! against the fully flattened key list, so resolution runs as a pure
//! transform before any instruction is interpreted: (message, fetched
//! table contents) -> resolved key list. Nothing is patched in place.

use std::collections::HashMap;

use solana_message::VersionedMessage;
use solana_pubkey::Pubkey;

use crate::errors::{ClaimerError, ClaimerResult};

/// One entry of the flattened account key list with its access flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccount {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Lookup table ids a message references, in message order.
pub fn referenced_tables(message: &VersionedMessage) -> Vec<Pubkey> {
    message
        .address_table_lookups()
        .map(|lookups| lookups.iter().map(|lookup| lookup.account_key).collect())
        .unwrap_or_default()
}

/// Flatten a message's account keys against fetched table contents.
///
/// The runtime ordering is static keys first (signer/writable flags derived
/// from the message header), then the writable addresses loaded from every
/// table in message order, then the readonly loaded addresses. Loaded
/// addresses can never sign.
pub fn resolve_account_keys(
    message: &VersionedMessage,
    tables: &HashMap<Pubkey, Vec<Pubkey>>,
) -> ClaimerResult<Vec<ResolvedAccount>> {
    let header = message.header();
    let static_keys = message.static_account_keys();
    let num_signers = header.num_required_signatures as usize;
    let num_readonly_signed = header.num_readonly_signed_accounts as usize;
    let num_readonly_unsigned = header.num_readonly_unsigned_accounts as usize;

    let mut resolved = Vec::with_capacity(static_keys.len());
    for (index, key) in static_keys.iter().enumerate() {
        let is_signer = index < num_signers;
        let is_writable = if is_signer {
            index < num_signers.saturating_sub(num_readonly_signed)
        } else {
            index < static_keys.len().saturating_sub(num_readonly_unsigned)
        };
        resolved.push(ResolvedAccount {
            pubkey: *key,
            is_signer,
            is_writable,
        });
    }

    let lookups = match message.address_table_lookups() {
        Some(lookups) => lookups,
        None => return Ok(resolved),
    };

    for lookup in lookups {
        let addresses = tables
            .get(&lookup.account_key)
            .ok_or(ClaimerError::LookupTableMissing(lookup.account_key))?;
        for &index in &lookup.writable_indexes {
            resolved.push(ResolvedAccount {
                pubkey: table_address(&lookup.account_key, addresses, index)?,
                is_signer: false,
                is_writable: true,
            });
        }
    }
    for lookup in lookups {
        let addresses = tables
            .get(&lookup.account_key)
            .ok_or(ClaimerError::LookupTableMissing(lookup.account_key))?;
        for &index in &lookup.readonly_indexes {
            resolved.push(ResolvedAccount {
                pubkey: table_address(&lookup.account_key, addresses, index)?,
                is_signer: false,
                is_writable: false,
            });
        }
    }

    Ok(resolved)
}

fn table_address(table: &Pubkey, addresses: &[Pubkey], index: u8) -> ClaimerResult<Pubkey> {
    addresses
        .get(index as usize)
        .copied()
        .ok_or(ClaimerError::LookupIndexOutOfRange {
            table: *table,
            index: index as usize,
            len: addresses.len(),
        })
}
