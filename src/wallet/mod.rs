//! Wallet keypair loading
//!
//! The claimer signs with exactly one keypair, decoded either from an
//! inline base58 secret or from a JSON byte-array keypair file (the format
//! `solana-keygen` writes). Either source must yield exactly 64 bytes.

use std::path::PathBuf;

use solana_keypair::Keypair;

use crate::config::WalletConfig;
use crate::errors::{ClaimerError, ClaimerResult};

/// ed25519 secret + public key, the layout keypair files store
pub const KEYPAIR_LENGTH: usize = 64;

/// Load the signing keypair from config.
///
/// The inline secret wins over the file path when both are set, matching
/// how the `SECRET_KEY_B58` environment override is expected to behave.
pub fn load(config: &WalletConfig) -> ClaimerResult<Keypair> {
    if let Some(secret) = config.secret_key_b58.as_deref().filter(|s| !s.is_empty()) {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| ClaimerError::Config(format!("decode secret_key_b58: {}", e)))?;
        return keypair_from_bytes(&bytes);
    }

    if let Some(path) = config.keypair_path.as_deref().filter(|s| !s.is_empty()) {
        let path = expand_home(path);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            ClaimerError::Config(format!("read keypair file {}: {}", path.display(), e))
        })?;
        let bytes: Vec<u8> = serde_json::from_str(&raw).map_err(|e| {
            ClaimerError::Config(format!("parse keypair file {}: {}", path.display(), e))
        })?;
        return keypair_from_bytes(&bytes);
    }

    Err(ClaimerError::WalletMissing)
}

fn keypair_from_bytes(bytes: &[u8]) -> ClaimerResult<Keypair> {
    if bytes.len() != KEYPAIR_LENGTH {
        return Err(ClaimerError::InvalidKeypairLength {
            actual: bytes.len(),
            expected: KEYPAIR_LENGTH,
        });
    }
    Keypair::from_bytes(bytes).map_err(|e| ClaimerError::Config(format!("invalid keypair: {}", e)))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
