//! Well-known program ids the claimer has to recognize

use once_cell::sync::Lazy;
use solana_pubkey::Pubkey;
use std::str::FromStr;

/// The original SPL token program
pub static TOKEN_PROGRAM_ID: Lazy<Pubkey> =
    Lazy::new(|| Pubkey::from_str("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA").unwrap());

/// The Token-2022 program
pub static TOKEN_2022_PROGRAM_ID: Lazy<Pubkey> =
    Lazy::new(|| Pubkey::from_str("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb").unwrap());

/// The associated token account program, which owns reward holding accounts
pub static ASSOCIATED_TOKEN_PROGRAM_ID: Lazy<Pubkey> =
    Lazy::new(|| Pubkey::from_str("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL").unwrap());

/// True for either of the two token program variants.
pub fn is_token_program(program_id: &Pubkey) -> bool {
    *program_id == *TOKEN_PROGRAM_ID || *program_id == *TOKEN_2022_PROGRAM_ID
}
