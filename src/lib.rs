//! Dual-chain identity and transaction layer.
//!
//! One recovery phrase yields an EVM address and a Bech32 address on the
//! message chain. This crate derives both, builds and signs transactions for
//! each side, executes typed-data permits on behalf of their owners, and
//! polls either chain for the outcome.
//!
//! ```text
//! keys → identity → { evm (builder, permits), chain (factory, bank) } → confirmation
//! ```

pub mod chain;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod evm;
pub mod identity;
pub mod keys;
pub mod observability;

pub use chain::{BankClient, BroadcastMode, TxFactory, TxResult};
pub use config::{load_config, NetworkConfig};
pub use confirmation::{CancelToken, Confirmation, Poller};
pub use error::{Error, Result};
pub use evm::{EvmTxBuilder, PermitSigner, SignedPermit, Wallet};
pub use identity::{ChainIdentity, Client, EvmIdentity, Identity};
