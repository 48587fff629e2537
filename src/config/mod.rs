//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! preset (mainnet/testnet/localnet) or TOML file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → NetworkConfig (validated, immutable)
//!     → registry.rs (chain-name → EVM chain-id)
//!     → shared via Arc by the Client
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - The chain-id table is a value passed to constructors, not a global

pub mod loader;
pub mod registry;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use registry::ChainRegistry;
pub use schema::{GasConfig, GasPrice, NetworkConfig, PollConfig};
