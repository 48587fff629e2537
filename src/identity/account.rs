//! The dual-chain identity.
//!
//! # Security
//! - The recovery phrase and passphrase are consumed at construction and not kept
//! - The EVM key lives in the wallet; the chain key lives in the client's key store
//! - `Debug` prints label and addresses only

use alloy::consensus::TxLegacy;
use alloy::primitives::{Address, B256};
use alloy::signers::Signature;
use cosmrs::crypto::PublicKey;
use cosmrs::tx::{Raw, SignDoc};
use secrecy::SecretString;
use std::sync::Arc;

use crate::chain::bank::BankClient;
use crate::chain::factory::TxFactory;
use crate::error::{Error, Result};
use crate::evm::permit::PermitSigner;
use crate::evm::transaction::EvmTxBuilder;
use crate::evm::wallet::Wallet;
use crate::identity::{ChainIdentity, Client, EvmIdentity};
use crate::keys::derivation::full_bip44_path;
use crate::keys::hdpath::HdPath;
use crate::keys::mnemonic::validate_mnemonic;

/// One user acting on both chains.
///
/// Built either from a recovery phrase (both addresses) or from a raw EVM
/// private key (EVM address only). Immutable once built.
#[derive(Clone)]
pub struct Identity {
    label: String,
    wallet: Wallet,
    chain_address: Option<String>,
    client: Client,
}

impl Identity {
    /// Derive both addresses from a recovery phrase.
    ///
    /// The chain key is registered in the client's key store under `label`
    /// at `m/44'/{coin_type}'/0'/0/0`, namespaced by the label. The EVM key
    /// is bound to the chain id the registry holds for the configured chain.
    ///
    /// Registration is the last fallible step, so an error leaves the label
    /// unbound.
    pub fn create(client: &Client, label: &str, phrase: &str, passphrase: &str) -> Result<Self> {
        if label.trim().is_empty() {
            return Err(Error::validation("label", "must not be empty"));
        }
        if !validate_mnemonic(phrase) {
            return Err(Error::validation("seed", "failed wordlist or checksum validation"));
        }

        let chain_id = client.evm_chain_id()?;
        let path: HdPath = full_bip44_path(client.config().coin_type).parse()?;
        let wallet = Wallet::from_mnemonic(phrase, passphrase, chain_id)?;
        let chain_address = client.keystore().register(label, phrase, passphrase, &path)?;

        tracing::info!(
            label = %label,
            evm_address = %wallet.address(),
            chain_address = %chain_address,
            chain_id = chain_id,
            "Identity created"
        );

        Ok(Self {
            label: label.to_string(),
            wallet,
            chain_address: Some(chain_address),
            client: client.clone(),
        })
    }

    /// EVM-only identity from a hex private key. Never has a chain address.
    pub fn from_private_key(client: &Client, label: &str, private_key_hex: &str) -> Result<Self> {
        if label.trim().is_empty() {
            return Err(Error::validation("label", "must not be empty"));
        }
        let chain_id = client.evm_chain_id()?;
        let wallet = Wallet::from_private_key(private_key_hex, chain_id)?;

        Ok(Self {
            label: label.to_string(),
            wallet,
            chain_address: None,
            client: client.clone(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn evm_address(&self) -> Address {
        self.wallet.address()
    }

    pub fn chain_address(&self) -> Option<&str> {
        self.chain_address.as_deref()
    }

    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Hex EVM private key. Re-importing it with
    /// [`Identity::from_private_key`] yields the same EVM address.
    pub fn export_private_key(&self) -> SecretString {
        self.wallet.export_private_key()
    }

    /// Transaction builder signing with this identity's EVM key.
    pub fn evm_builder(&self) -> EvmTxBuilder {
        EvmTxBuilder::from_client(Arc::new(self.wallet.clone()), &self.client)
    }

    pub fn permit_signer(&self) -> PermitSigner {
        PermitSigner::from_client(Arc::new(self.wallet.clone()), &self.client)
    }

    /// Message-chain transaction factory with the configured defaults.
    pub fn tx_factory(&self) -> Result<TxFactory> {
        TxFactory::from_client(Arc::new(self.clone()), &self.client)
    }

    /// Balance queries and bank sends for both of this identity's addresses.
    pub fn bank(&self) -> Result<BankClient> {
        Ok(BankClient::new(
            self.tx_factory()?,
            self.evm_address(),
            self.client.config(),
        ))
    }
}

impl EvmIdentity for Identity {
    fn evm_address(&self) -> Address {
        self.wallet.address()
    }

    fn evm_chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    fn sign_evm_hash(&self, hash: &B256) -> Result<Signature> {
        self.wallet.sign_hash(hash)
    }

    fn sign_evm_transaction(&self, tx: &mut TxLegacy) -> Result<Signature> {
        self.wallet.sign_transaction(tx)
    }
}

impl ChainIdentity for Identity {
    fn key_label(&self) -> &str {
        &self.label
    }

    fn chain_address(&self) -> Option<&str> {
        self.chain_address.as_deref()
    }

    fn chain_public_key(&self) -> Result<PublicKey> {
        if self.chain_address.is_none() {
            return Err(Error::UninitializedSigner {
                label: self.label.clone(),
            });
        }
        self.client.keystore().public_key(&self.label)
    }

    fn sign_chain_doc(&self, doc: SignDoc) -> Result<Raw> {
        if self.chain_address.is_none() {
            return Err(Error::UninitializedSigner {
                label: self.label.clone(),
            });
        }
        self.client.keystore().sign(&self.label, doc)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("label", &self.label)
            .field("evm_address", &self.wallet.address())
            .field("chain_address", &self.chain_address)
            .field("chain_id", &self.wallet.chain_id())
            .finish()
    }
}
