//! EVM chain subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkConfig (RPC URL + failovers, chain id)
//!     → client.rs (alloy providers, read failover, chain id check)
//!     → transaction.rs (estimate, nonce, price, sign, submit)
//!     → contract.rs (certificate contract calls on top of the builder)
//!     → permit.rs (typed-data sign by owner, execute by broadcaster)
//! ```
//!
//! # Security Constraints
//! - Private keys never leave `wallet.rs` except through an explicit export
//! - Every signature is bound to a chain id
//! - Nonce-consuming submissions are serialized per sender (`nonce.rs`)

pub mod client;
pub mod contract;
pub mod nonce;
pub mod permit;
pub mod rpc;
pub mod transaction;
pub mod types;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use client::BlockchainClient;
pub use contract::{certificate_constructor_args, ICertificateNFT};
pub use nonce::NonceManager;
pub use permit::{
    recover_permit_signer, sign_permit_offline, Permit, PermitDomain, PermitForAll, PermitMessage,
    PermitSignature, PermitSigner, SignedPermit,
};
pub use rpc::EvmRpc;
pub use transaction::EvmTxBuilder;
pub use types::{ChainId, Deployment, EvmReceipt, SignedEvmTx};
pub use wallet::Wallet;
