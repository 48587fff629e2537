//! Local key-store capability for chain-native keys.
//!
//! # Responsibilities
//! - Register an account from (label, phrase, passphrase, path)
//! - Resolve a label to its address and public key
//! - Sign message-chain sign docs without handing out key material
//!
//! # Security
//! - Key bytes are held in `SecretBox` and zeroized on drop
//! - Signing keys are rebuilt per call and dropped straight after
//! - `Debug` prints labels and addresses only

use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::crypto::PublicKey;
use cosmrs::tx::{Raw, SignDoc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretBox};

use crate::error::{Error, Result};
use crate::keys::derivation::{chain_address, derive_chain_key};
use crate::keys::hdpath::HdPath;
use crate::keys::mnemonic::seed_from_mnemonic;

/// Where chain-native keys live.
///
/// Registering the same label twice is accepted only when it yields the same
/// address; any other collision is a `KeyStore` error and the existing entry
/// is left untouched.
pub trait KeyStore: Send + Sync {
    /// Derive the key for `label` at `path` and register it. Returns the
    /// Bech32 address.
    fn register(&self, label: &str, phrase: &str, passphrase: &str, path: &HdPath) -> Result<String>;

    fn address(&self, label: &str) -> Option<String>;

    fn public_key(&self, label: &str) -> Result<PublicKey>;

    /// Sign `doc` with the key registered under `label`.
    fn sign(&self, label: &str, doc: SignDoc) -> Result<Raw>;
}

struct KeyEntry {
    address: String,
    key: SecretBox<[u8; 32]>,
}

/// In-memory key store. Nothing is persisted; entries live as long as the store.
pub struct MemoryKeyStore {
    prefix: String,
    entries: DashMap<String, KeyEntry>,
}

impl MemoryKeyStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn signing_key(&self, label: &str) -> Result<(SigningKey, String)> {
        let entry = self
            .entries
            .get(label)
            .ok_or_else(|| Error::KeyStore(format!("no key registered under '{}'", label)))?;
        let key = SigningKey::from_slice(entry.key.expose_secret())
            .map_err(|e| Error::KeyStore(format!("stored key for '{}' is unusable: {}", label, e)))?;
        Ok((key, entry.address.clone()))
    }
}

impl KeyStore for MemoryKeyStore {
    fn register(&self, label: &str, phrase: &str, passphrase: &str, path: &HdPath) -> Result<String> {
        if label.trim().is_empty() {
            return Err(Error::validation("label", "must not be empty"));
        }

        let seed = seed_from_mnemonic(phrase, passphrase)?;
        let key = derive_chain_key(seed.expose_secret(), path, label)?;
        let address = chain_address(key.expose_secret(), &self.prefix)?;

        match self.entries.entry(label.to_string()) {
            Entry::Occupied(existing) => {
                if existing.get().address == address {
                    tracing::debug!(label = %label, address = %address, "Key already registered");
                    Ok(address)
                } else {
                    Err(Error::KeyStore(format!(
                        "label '{}' is already bound to {}",
                        label,
                        existing.get().address
                    )))
                }
            }
            Entry::Vacant(slot) => {
                tracing::info!(label = %label, address = %address, path = %path, "Key registered");
                slot.insert(KeyEntry {
                    address: address.clone(),
                    key,
                });
                Ok(address)
            }
        }
    }

    fn address(&self, label: &str) -> Option<String> {
        self.entries.get(label).map(|e| e.address.clone())
    }

    fn public_key(&self, label: &str) -> Result<PublicKey> {
        let (key, _) = self.signing_key(label)?;
        Ok(key.public_key())
    }

    fn sign(&self, label: &str, doc: SignDoc) -> Result<Raw> {
        let (key, address) = self.signing_key(label)?;
        doc.sign(&key).map_err(|e| Error::SigningFailed {
            from: address,
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("MemoryKeyStore")
            .field("prefix", &self.prefix)
            .field("labels", &labels)
            .finish()
    }
}
