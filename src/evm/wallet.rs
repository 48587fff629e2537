//! EVM signing context.
//!
//! # Security
//! - Keys come from a recovery phrase or an explicit hex import
//! - Keys are never logged; `Debug` shows the address only
//! - Every signature is bound to the wallet's chain id

use alloy::consensus::TxLegacy;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, Signer, SignerSync};
use secrecy::SecretString;

use crate::error::{Error, Result};
use crate::identity::EvmIdentity;
use crate::keys::derivation::{derive_evm, evm_signer_from_hex};

/// A private key opened for one EVM chain.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    chain_id: u64,
}

impl Wallet {
    pub fn new(mut signer: PrivateKeySigner, chain_id: u64) -> Self {
        signer.set_chain_id(Some(chain_id));
        Self { signer, chain_id }
    }

    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for transaction signing
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> Result<Self> {
        let wallet = Self::new(evm_signer_from_hex(private_key_hex)?, chain_id);
        tracing::info!(
            address = %wallet.address(),
            chain_id = chain_id,
            "Wallet initialized from private key"
        );
        Ok(wallet)
    }

    /// Derive the wallet for a recovery phrase and passphrase.
    pub fn from_mnemonic(phrase: &str, passphrase: &str, chain_id: u64) -> Result<Self> {
        Ok(Self::new(derive_evm(phrase, passphrase)?, chain_id))
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this wallet is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a 32-byte digest as-is.
    pub fn sign_hash(&self, hash: &B256) -> Result<Signature> {
        self.signer.sign_hash_sync(hash).map_err(|e| Error::SigningFailed {
            from: self.address().to_string(),
            reason: e.to_string(),
        })
    }

    /// Sign arbitrary message bytes (with Ethereum prefix).
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        self.signer
            .sign_message_sync(message)
            .map_err(|e| Error::SigningFailed {
                from: self.address().to_string(),
                reason: e.to_string(),
            })
    }

    /// Sign a legacy transaction with EIP-155 replay protection.
    pub fn sign_transaction(&self, tx: &mut TxLegacy) -> Result<Signature> {
        if tx.chain_id != Some(self.chain_id) {
            return Err(Error::SigningFailed {
                from: self.address().to_string(),
                reason: format!(
                    "transaction chain id {:?} does not match wallet chain id {}",
                    tx.chain_id, self.chain_id
                ),
            });
        }
        self.signer
            .sign_transaction_sync(tx)
            .map_err(|e| Error::SigningFailed {
                from: self.address().to_string(),
                reason: e.to_string(),
            })
    }

    /// Hex private key, for audit export. Re-importing it with
    /// [`Wallet::from_private_key`] yields the same address.
    pub fn export_private_key(&self) -> SecretString {
        SecretString::from(alloy::hex::encode(self.signer.to_bytes()))
    }
}

impl EvmIdentity for Wallet {
    fn evm_address(&self) -> Address {
        self.address()
    }

    fn evm_chain_id(&self) -> u64 {
        self.chain_id
    }

    fn sign_evm_hash(&self, hash: &B256) -> Result<Signature> {
        self.sign_hash(hash)
    }

    fn sign_evm_transaction(&self, tx: &mut TxLegacy) -> Result<Signature> {
        self.sign_transaction(tx)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}
