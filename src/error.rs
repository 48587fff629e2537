//! Error taxonomy shared by every subsystem.
//!
//! Transport failures, logical (on-chain) failures and confirmation timeouts
//! are separate variants so callers can tell "the node never saw it" apart
//! from "the chain executed it and said no" apart from "we stopped waiting".
//! Nothing in this crate retries on any of them.

use thiserror::Error;

use crate::evm::types::EvmReceipt;

#[derive(Error, Debug)]
pub enum Error {
    /// Mnemonic failed wordlist or checksum validation.
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// Caller input had the wrong shape.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Cryptographic derivation failed after input validation passed.
    #[error("key derivation failed: {0}")]
    Derivation(String),

    #[error("key store error: {0}")]
    KeyStore(String),

    #[error("unknown chain name '{0}'")]
    UnknownChain(String),

    #[error("no messages provided to broadcast")]
    NoMessages,

    #[error("signer '{label}' has no chain-native address")]
    UninitializedSigner { label: String },

    #[error("failed to prepare transaction factory for {address}: {reason}")]
    FactoryPrepareFailed { address: String, reason: String },

    #[error("cannot estimate gas in offline mode")]
    OfflineSimulationUnavailable,

    #[error("gas estimation failed (from: {from}): {reason}")]
    GasEstimationFailed { from: String, reason: String },

    #[error("failed to build unsigned transaction (from: {from}, gas: {gas}): {reason}")]
    BuildFailed { from: String, gas: u64, reason: String },

    #[error("signing failed (from: {from}): {reason}")]
    SigningFailed { from: String, reason: String },

    #[error("failed to encode transaction: {0}")]
    EncodingFailed(String),

    /// The node accepted the call but the transaction carries a non-zero code.
    #[error("transaction {hash} failed with code {code}: {raw_log}")]
    TxRejected { code: u32, raw_log: String, hash: String },

    #[error("failed to pack {function}: {reason}")]
    PackingFailed { function: &'static str, reason: String },

    #[error("failed to fetch nonce for {address}: {reason}")]
    NonceFetchFailed { address: String, reason: String },

    #[error("failed to submit transaction (from: {from}, chain: {chain}): {reason}")]
    SubmissionFailed { from: String, chain: String, reason: String },

    /// Transport-level RPC failure.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node serves a different chain than the one configured.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// EVM transaction was mined with a failure status.
    #[error("transaction {} reverted in block {:?}", .receipt.tx_hash, .receipt.block_number)]
    EvmTxFailed { receipt: Box<EvmReceipt> },

    /// Confirmation was not observed in time. The transaction may still land.
    #[error("timeout waiting for transaction {hash} after {waited_secs}s")]
    ConfirmationTimeout { hash: String, waited_secs: u64 },

    #[error("confirmation wait for {0} was cancelled")]
    Cancelled(String),

    /// An execution request disagrees with what the permit owner signed.
    #[error("permit scope violation: {0}")]
    PermitScope(String),
}

impl Error {
    /// Shorthand for a `Validation` error.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// True when the transaction reached the chain and executed with a failure.
    pub fn is_logical_failure(&self) -> bool {
        matches!(self, Self::TxRejected { .. } | Self::EvmTxFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
