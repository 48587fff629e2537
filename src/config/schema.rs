//! Configuration schema definitions.
//!
//! This module defines the network configuration consumed by every client in
//! the crate. All types derive Serde traits for deserialization from config
//! files, and every field has a default so a minimal file only needs to name
//! what differs from the built-in presets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Bech32 human-readable prefix for chain-native account addresses.
pub const DEFAULT_BECH32_PREFIX: &str = "6x";

/// Registered coin type for chain-native keys.
pub const DEFAULT_COIN_TYPE: u32 = 118;

/// Base (fee) denomination on the message chain.
pub const BASE_DENOM: &str = "usix";

/// Denomination of the EVM-side native balance.
pub const EVM_DENOM: &str = "asix";

/// Root configuration for one deployment of the dual chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chain name. Doubles as the message-chain id used when signing and as
    /// the lookup key into the EVM chain-id registry.
    pub chain_name: String,

    /// Message-chain REST (LCD) endpoint.
    pub api_url: String,

    /// Message-chain Tendermint RPC endpoint.
    pub rpc_url: String,

    /// EVM JSON-RPC endpoint. Transactions are only ever submitted here.
    pub evm_rpc_url: String,

    /// Additional EVM endpoints tried in order for read-only queries.
    #[serde(default)]
    pub evm_failover_urls: Vec<String>,

    /// Bech32 prefix for chain-native addresses.
    pub bech32_prefix: String,

    /// BIP-44 coin type for chain-native keys.
    pub coin_type: u32,

    pub base_denom: String,

    pub evm_denom: String,

    /// Per-request RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Default gas settings for the message-chain transaction factory.
    pub gas: GasConfig,

    /// Confirmation polling settings shared by both chains.
    pub poll: PollConfig,

    /// Extra chain-name → EVM chain-id entries layered over the built-ins.
    #[serde(default)]
    pub chain_ids: HashMap<String, u64>,
}

impl NetworkConfig {
    /// Production network.
    pub fn mainnet() -> Self {
        Self {
            chain_name: "sixnet".to_string(),
            api_url: "https://sixnet-api.sixprotocol.net".to_string(),
            rpc_url: "https://sixnet-rpc.sixprotocol.net:443".to_string(),
            evm_rpc_url: "https://sixnet-rpc.sixprotocol.net".to_string(),
            ..Self::default()
        }
    }

    /// Public test network.
    pub fn testnet() -> Self {
        Self {
            chain_name: "fivenet".to_string(),
            api_url: "https://api1.fivenet.sixprotocol.net".to_string(),
            rpc_url: "https://rpc1.fivenet.sixprotocol.net".to_string(),
            evm_rpc_url: "https://rpc-evm.fivenet.sixprotocol.net".to_string(),
            ..Self::default()
        }
    }

    /// Single-node local network.
    pub fn localnet() -> Self {
        Self::default()
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_name: "testnet".to_string(),
            api_url: "http://localhost:1317".to_string(),
            rpc_url: "http://localhost:26657".to_string(),
            evm_rpc_url: "http://localhost:8545".to_string(),
            evm_failover_urls: Vec::new(),
            bech32_prefix: DEFAULT_BECH32_PREFIX.to_string(),
            coin_type: DEFAULT_COIN_TYPE,
            base_denom: BASE_DENOM.to_string(),
            evm_denom: EVM_DENOM.to_string(),
            rpc_timeout_secs: 10,
            gas: GasConfig::default(),
            poll: PollConfig::default(),
            chain_ids: HashMap::new(),
        }
    }
}

/// Gas defaults for message-chain transactions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasConfig {
    /// Gas limit used when simulation is off.
    pub gas_limit: u64,

    /// Price per unit of gas, e.g. `1.25usix`.
    pub gas_price: String,

    /// Multiplier applied to simulated gas usage.
    pub gas_adjustment: f64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            gas_limit: 1_000_000,
            gas_price: "1.25usix".to_string(),
            gas_adjustment: 1.5,
        }
    }
}

/// Confirmation polling cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            timeout_secs: 20,
        }
    }
}

/// A decimal gas price attached to a denomination, parsed from `1.25usix`.
#[derive(Debug, Clone, PartialEq)]
pub struct GasPrice {
    pub amount: f64,
    pub denom: String,
}

impl GasPrice {
    /// Fee owed for `gas` units, rounded up to a whole base unit.
    pub fn fee_for(&self, gas: u64) -> u128 {
        (gas as f64 * self.amount).ceil() as u128
    }
}

impl FromStr for GasPrice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("gas price '{}' has no denomination", s))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() {
            return Err(format!("gas price '{}' has no amount", s));
        }
        let amount: f64 = amount
            .parse()
            .map_err(|e| format!("gas price '{}' has invalid amount: {}", s, e))?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(format!("gas price '{}' must be a non-negative number", s));
        }
        if !denom.chars().all(|c| c.is_ascii_alphanumeric() || c == '/') {
            return Err(format!("gas price '{}' has invalid denomination", s));
        }
        Ok(Self {
            amount,
            denom: denom.to_string(),
        })
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}
