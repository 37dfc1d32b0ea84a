//! Error handling for the auto-claimer.
//!
//! One enum covers the whole taxonomy: startup failures (config, wallet,
//! learning) are fatal and propagate out of `main`, everything else is a
//! per-attempt soft failure that the scheduled loop logs and survives.

use solana_pubkey::Pubkey;
use thiserror::Error;

/// Main error type for the auto-claimer.
#[derive(Error, Debug)]
pub enum ClaimerError {
    /// The configured reference signature is not a valid base58 signature.
    #[error("invalid reference signature: {0}")]
    InvalidSignature(String),

    /// The reference transaction could not be decoded from its wire encoding.
    #[error("could not decode reference transaction")]
    UndecodableTransaction,

    /// A versioned reference transaction names a lookup table that does not exist.
    #[error("address lookup table {0} not found")]
    LookupTableMissing(Pubkey),

    /// A lookup table account exists but its stored state is malformed.
    #[error("malformed address lookup table {0}")]
    LookupTableDecode(Pubkey),

    /// A lookup references an index past the end of its table.
    #[error("lookup index {index} exceeds table {table} with {len} addresses")]
    LookupIndexOutOfRange {
        table: Pubkey,
        index: usize,
        len: usize,
    },

    /// An instruction references an account index past the resolved key list.
    #[error("instruction account index {index} exceeds resolved key count {len}")]
    AccountIndexOutOfRange { index: usize, len: usize },

    /// The reference transaction carries no usable instruction for the claim program.
    #[error("could not extract claim instruction for program {0} from reference transaction")]
    TemplateNotFound(Pubkey),

    /// Neither the transaction nor the config tells us which token program is in use.
    #[error("could not detect token program id; set claim.token_program_id")]
    TokenProgramUnknown,

    /// The wallet secret decodes to the wrong number of bytes.
    #[error("keypair has {actual} bytes; want {expected}")]
    InvalidKeypairLength { actual: usize, expected: usize },

    /// No wallet source was configured at all.
    #[error("no wallet configured: set wallet.keypair_path or SECRET_KEY_B58")]
    WalletMissing,

    /// The assembled transaction requires a signer other than the configured wallet.
    #[error("required signer {0} is not the configured wallet")]
    NoMatchingSigner(Pubkey),

    /// Signing failed for the configured wallet.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Simulation reported a program error; `logs` carries the program's
    /// diagnostic output. Send is never attempted after this.
    #[error("simulation failed: {reason}")]
    SimulationFailed { reason: String, logs: Vec<String> },

    /// A network or node failure on one of the RPC calls.
    #[error("rpc error during {context}: {source}")]
    Rpc {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// Bad configuration detected at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClaimerError {
    /// Wrap a gateway failure with the operation it happened in.
    pub fn rpc(context: &'static str, source: anyhow::Error) -> Self {
        ClaimerError::Rpc { context, source }
    }
}

/// Result type alias for the auto-claimer.
pub type ClaimerResult<T> = Result<T, ClaimerError>;
