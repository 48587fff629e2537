//! Recovery phrase handling.
//!
//! # Security
//! - Phrases and seeds only live inside `secrecy` wrappers once they leave
//!   the caller's hands
//! - Nothing here logs phrase or seed material

use bip39::{Language, Mnemonic};
use secrecy::{ExposeSecret, SecretBox, SecretString};

use crate::error::{Error, Result};

/// Word count for freshly generated phrases (256 bits of entropy).
pub const GENERATED_WORD_COUNT: usize = 24;

/// Generate a new 24-word English recovery phrase.
pub fn generate_mnemonic() -> Result<SecretString> {
    let mnemonic = Mnemonic::generate_in(Language::English, GENERATED_WORD_COUNT)
        .map_err(|e| Error::Derivation(format!("mnemonic generation failed: {}", e)))?;
    Ok(SecretString::from(mnemonic.to_string()))
}

/// True when `phrase` passes English wordlist and checksum validation.
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_in(Language::English, phrase).is_ok()
}

/// Parse a phrase, failing with `InvalidSeed` when validation fails.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic> {
    Mnemonic::parse_in(Language::English, phrase).map_err(|e| Error::InvalidSeed(e.to_string()))
}

/// 64-byte BIP-39 seed for `phrase` + `passphrase`.
///
/// Only reached after the phrase validates; an invalid phrase never yields a
/// seed.
pub fn seed_from_mnemonic(phrase: &str, passphrase: &str) -> Result<SecretBox<[u8; 64]>> {
    let mnemonic = parse_mnemonic(phrase)?;
    Ok(SecretBox::new(Box::new(mnemonic.to_seed(passphrase))))
}

/// Same as [`seed_from_mnemonic`] for callers already holding secret strings.
pub fn seed_from_secret(phrase: &SecretString, passphrase: &SecretString) -> Result<SecretBox<[u8; 64]>> {
    seed_from_mnemonic(phrase.expose_secret(), passphrase.expose_secret())
}
