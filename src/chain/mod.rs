//! Message-chain subsystem.
//!
//! # Data Flow
//! ```text
//! messages (Any)
//!     → factory.rs (account/sequence, optional simulation, build, sign, encode)
//!     → rpc.rs / rest.rs (REST gateway: simulate, broadcast, tx lookup, balances)
//!     → broadcaster.rs (broadcast, then confirmation poller)
//! bank.rs  balances for both address forms, MsgSend through the factory
//! ```
//!
//! A transaction the node accepts with a non-zero code is a logical failure
//! (`TxRejected`), never a transport error.

pub mod bank;
pub mod broadcaster;
pub mod factory;
pub mod rest;
pub mod rpc;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use bank::BankClient;
pub use factory::TxFactory;
pub use rest::RestClient;
pub use rpc::ChainRpc;
pub use types::{AccountInfo, BroadcastMode, Coin, TxResponse, TxResult};
