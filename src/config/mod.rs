//! Configuration loading and validation
//!
//! The config file is TOML. Every field has a default except the claim
//! program id and the reference signature, which the claimer cannot run
//! without. `RPC_URL` and `SECRET_KEY_B58` environment variables override
//! their file counterparts so secrets can stay out of the file.

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use solana_commitment_config::CommitmentConfig;
use solana_pubkey::Pubkey;

use crate::errors::{ClaimerError, ClaimerResult};

/// RPC endpoint settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub url: String,
    /// Consistency level used for submission and reads ("confirmed", "finalized", ...)
    pub commitment: String,
    /// Request timeout, e.g. "10s"
    pub timeout: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            timeout: "10s".to_string(),
        }
    }
}

impl RpcConfig {
    pub fn commitment_config(&self) -> ClaimerResult<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|_| ClaimerError::Config(format!("unknown commitment {:?}", self.commitment)))
    }

    pub fn timeout_duration(&self) -> ClaimerResult<Duration> {
        parse_duration(&self.timeout)
    }
}

/// Wallet secret source: inline base58 secret or JSON keypair file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub keypair_path: Option<String>,
    pub secret_key_b58: Option<String>,
}

/// Claim parameters learned against and replayed
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClaimConfig {
    /// Signature of the transaction used as the replay template
    pub reference_signature: String,
    /// Program whose instruction is replayed
    pub program_id: String,
    /// Optional override when the token program cannot be detected
    pub token_program_id: Option<String>,
    /// Base period between claim attempts, e.g. "15m"
    pub interval: String,
    /// Fraction of the interval used as random jitter, in [0, 1)
    pub jitter: f64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            reference_signature: String::new(),
            program_id: String::new(),
            token_program_id: None,
            interval: "15m".to_string(),
            jitter: 0.2,
        }
    }
}

impl ClaimConfig {
    pub fn interval_duration(&self) -> ClaimerResult<Duration> {
        parse_duration(&self.interval)
    }

    pub fn program_pubkey(&self) -> ClaimerResult<Pubkey> {
        Pubkey::from_str(&self.program_id)
            .map_err(|_| ClaimerError::Config(format!("invalid claim.program_id {:?}", self.program_id)))
    }

    pub fn token_program_pubkey(&self) -> ClaimerResult<Option<Pubkey>> {
        match &self.token_program_id {
            None => Ok(None),
            Some(s) => Pubkey::from_str(s).map(Some).map_err(|_| {
                ClaimerError::Config(format!("invalid claim.token_program_id {:?}", s))
            }),
        }
    }
}

/// Fee knobs applied to every built transaction
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeesConfig {
    pub compute_unit_limit: Option<u32>,
    pub priority_microlamports: Option<u64>,
}

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// debug|info|warn|error
    pub level: String,
    /// json|text
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

fn default_max_retries() -> usize {
    3
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc: RpcConfig,
    pub wallet: WalletConfig,
    pub claim: ClaimConfig,
    pub fees: FeesConfig,
    /// Bounded resend count handed to the RPC node
    pub max_retries: usize,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            wallet: WalletConfig::default(),
            claim: ClaimConfig::default(),
            fees: FeesConfig::default(),
            max_retries: default_max_retries(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load a config file, apply environment overrides, and validate.
    pub fn load(path: &Path) -> ClaimerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ClaimerError::Config(format!("read {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&raw)
            .map_err(|e| ClaimerError::Config(format!("parse {}: {}", path.display(), e)))?;

        if let Ok(url) = env::var("RPC_URL") {
            if !url.is_empty() {
                config.rpc.url = url;
            }
        }
        if let Ok(secret) = env::var("SECRET_KEY_B58") {
            if !secret.is_empty() {
                config.wallet.secret_key_b58 = Some(secret);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check everything that should fail at startup rather than mid-run.
    pub fn validate(&self) -> ClaimerResult<()> {
        if self.claim.program_id.is_empty() {
            return Err(ClaimerError::Config("claim.program_id required".to_string()));
        }
        self.claim.program_pubkey()?;
        self.claim.token_program_pubkey()?;
        if !(0.0..1.0).contains(&self.claim.jitter) {
            return Err(ClaimerError::Config(format!(
                "claim.jitter must be in [0, 1), got {}",
                self.claim.jitter
            )));
        }
        self.claim.interval_duration()?;
        self.rpc.commitment_config()?;
        self.rpc.timeout_duration()?;
        Ok(())
    }
}

/// Parse a human duration string like "15m" or "90s".
pub fn parse_duration(s: &str) -> ClaimerResult<Duration> {
    humantime::parse_duration(s.trim())
        .map_err(|e| ClaimerError::Config(format!("bad duration {:?}: {}", s, e)))
}
