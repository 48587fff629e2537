//! Seed → key derivation for both ledgers.
//!
//! # Data Flow
//! ```text
//! phrase + passphrase ──▶ BIP-39 seed (64 bytes)
//!     ├─▶ seed[0..32] ─────────────────────────────▶ EVM private key ─▶ 0x address
//!     └─▶ BIP-32 at <path>/<label namespace>' ─────▶ chain key ──────▶ bech32 address
//! ```
//!
//! The EVM key is the leading half of the seed, not a BIP-32 child. The chain
//! key is namespaced by the account label, so two labels over one seed yield
//! two chain addresses but the same EVM address.

use alloy::primitives::keccak256;
use alloy::signers::local::PrivateKeySigner;
use bip32::XPrv;
use cosmrs::crypto::secp256k1::SigningKey;
use secrecy::{ExposeSecret, SecretBox};

use crate::error::{Error, Result};
use crate::keys::hdpath::HdPath;
use crate::keys::mnemonic::seed_from_mnemonic;

/// SLIP-44 coin type for Ethereum-style keys.
pub const ETH_COIN_TYPE: u32 = 60;

/// `m/44'/{coin_type}'/0'/0/0`.
pub fn full_bip44_path(coin_type: u32) -> String {
    format!("m/44'/{}'/0'/0/0", coin_type)
}

/// Hardened child index that namespaces a label under a derivation path.
///
/// First four bytes of `keccak256(label)` read big-endian, top bit cleared.
pub fn label_namespace_index(label: &str) -> u32 {
    let hash = keccak256(label.as_bytes());
    u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]]) & 0x7FFF_FFFF
}

/// EVM signer for `phrase` + `passphrase`. Fails with `InvalidSeed` before
/// touching any key material when the phrase does not validate.
pub fn derive_evm(phrase: &str, passphrase: &str) -> Result<PrivateKeySigner> {
    let seed = seed_from_mnemonic(phrase, passphrase)?;
    evm_signer_from_seed(seed.expose_secret())
}

pub fn evm_signer_from_seed(seed: &[u8; 64]) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_slice(&seed[..32])
        .map_err(|e| Error::Derivation(format!("seed prefix is not a valid secp256k1 scalar: {}", e)))
}

/// Parse a hex private key, with or without `0x`.
pub fn evm_signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner> {
    let key_hex = private_key_hex.trim();
    let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
    if key_hex.len() != 64 {
        return Err(Error::validation("private_key", "expected 32 bytes of hex"));
    }
    key_hex
        .parse()
        .map_err(|e| Error::validation("private_key", format!("invalid private key format: {}", e)))
}

/// Chain-native key bytes at `path` extended by the label's namespace index.
pub fn derive_chain_key(seed: &[u8; 64], path: &HdPath, label: &str) -> Result<SecretBox<[u8; 32]>> {
    let namespaced = path.child(label_namespace_index(label), true)?;
    let xprv = XPrv::derive_from_path(seed, &namespaced.to_derivation_path()?)
        .map_err(|e| Error::Derivation(format!("BIP-32 derivation at {} failed: {}", path, e)))?;
    Ok(SecretBox::new(Box::new(xprv.to_bytes())))
}

/// Bech32 account address for raw chain key bytes.
pub fn chain_address(key: &[u8; 32], prefix: &str) -> Result<String> {
    let signing_key =
        SigningKey::from_slice(key).map_err(|e| Error::Derivation(format!("invalid chain key: {}", e)))?;
    let account = signing_key
        .public_key()
        .account_id(prefix)
        .map_err(|e| Error::Derivation(format!("bech32 encoding failed: {}", e)))?;
    Ok(account.to_string())
}
