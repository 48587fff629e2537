//! Chain-name → EVM chain-id lookup.
//!
//! Built once from the built-in networks plus any overrides in the loaded
//! config, then handed to constructors by reference. Never mutated after
//! construction.

use std::collections::HashMap;

use crate::config::schema::NetworkConfig;
use crate::error::{Error, Result};

/// Networks known without any configuration.
pub const BUILTIN_CHAIN_IDS: [(&str, u64); 3] = [("sixnet", 98), ("fivenet", 150), ("testnet", 666)];

#[derive(Debug, Clone)]
pub struct ChainRegistry {
    ids: HashMap<String, u64>,
}

impl ChainRegistry {
    /// Registry holding only the built-in networks.
    pub fn builtin() -> Self {
        let ids = BUILTIN_CHAIN_IDS
            .iter()
            .map(|(name, id)| (name.to_string(), *id))
            .collect();
        Self { ids }
    }

    /// Built-ins overlaid with the config's `chain_ids` table.
    pub fn from_config(config: &NetworkConfig) -> Self {
        let mut registry = Self::builtin();
        for (name, id) in &config.chain_ids {
            registry.ids.insert(name.clone(), *id);
        }
        registry
    }

    /// EVM chain id for `name`.
    pub fn chain_id(&self, name: &str) -> Result<u64> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownChain(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
