//! Key material: phrases, seeds, derivation paths and the key store.
//!
//! # Data Flow
//! ```text
//! mnemonic.rs   phrase validation, seed (BIP-39)
//!     → derivation.rs  EVM key (seed prefix), chain key (BIP-32 + label namespace)
//!     → keystore.rs    label → chain key, signing
//! hdpath.rs     path parsing, sibling iteration
//! ```
//!
//! # Security Constraints
//! - Validation gates derivation: an invalid phrase never produces a key
//! - Seeds and keys are wrapped in `secrecy` types and never logged

pub mod derivation;
pub mod hdpath;
pub mod keystore;
pub mod mnemonic;

pub use derivation::{derive_evm, evm_signer_from_hex, full_bip44_path, ETH_COIN_TYPE};
pub use hdpath::{HdPath, HdPathIterator};
pub use keystore::{KeyStore, MemoryKeyStore};
pub use mnemonic::{generate_mnemonic, validate_mnemonic};
