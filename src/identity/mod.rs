//! Identities and the client bundle they act through.
//!
//! # Data Flow
//! ```text
//! NetworkConfig → client.rs (EVM RPC + message-chain RPC + key store + registry)
//! phrase + passphrase + label → account.rs (Identity: EVM wallet + key-store label)
//! Identity → capability traits below → builders in `evm` and `chain`
//! ```
//!
//! Builders never hold an `Identity` directly. They take the capability they
//! need, so an EVM-only identity can drive the EVM builder and simply has no
//! message-chain capability.

pub mod account;
pub mod client;

use alloy::consensus::TxLegacy;
use alloy::primitives::{Address, B256};
use alloy::signers::Signature;
use cosmrs::crypto::PublicKey;
use cosmrs::tx::{Raw, SignDoc};

use crate::error::Result;

pub use account::Identity;
pub use client::Client;

/// Signing on the EVM chain.
pub trait EvmIdentity: Send + Sync {
    fn evm_address(&self) -> Address;

    /// Chain id every signature is bound to.
    fn evm_chain_id(&self) -> u64;

    /// Sign a prehashed 32-byte digest.
    fn sign_evm_hash(&self, hash: &B256) -> Result<Signature>;

    fn sign_evm_transaction(&self, tx: &mut TxLegacy) -> Result<Signature>;
}

/// Signing on the message chain.
pub trait ChainIdentity: Send + Sync {
    /// Key-store label the chain key is registered under.
    fn key_label(&self) -> &str;

    /// `None` for identities without a chain-native key.
    fn chain_address(&self) -> Option<&str>;

    fn chain_public_key(&self) -> Result<PublicKey>;

    fn sign_chain_doc(&self, doc: SignDoc) -> Result<Raw>;
}
