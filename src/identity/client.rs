//! Shared handles to both chains.

use std::sync::Arc;

use crate::chain::rest::RestClient;
use crate::chain::rpc::ChainRpc;
use crate::config::validation::validate_config;
use crate::config::{ChainRegistry, NetworkConfig};
use crate::error::{Error, Result};
use crate::evm::client::BlockchainClient;
use crate::evm::nonce::NonceManager;
use crate::evm::rpc::EvmRpc;
use crate::keys::keystore::{KeyStore, MemoryKeyStore};

/// Everything identities and builders share: the two node connections, the
/// key store, the chain-id registry and the per-sender nonce locks.
///
/// Cheap to clone; clones share all handles.
#[derive(Clone)]
pub struct Client {
    config: Arc<NetworkConfig>,
    registry: Arc<ChainRegistry>,
    evm: Arc<dyn EvmRpc>,
    chain: Arc<dyn ChainRpc>,
    keystore: Arc<dyn KeyStore>,
    nonces: NonceManager,
}

impl Client {
    /// Validate `config` and open both node connections.
    ///
    /// The EVM node must report the chain id the registry maps the chain
    /// name to. An unreachable node is logged, not fatal.
    pub async fn connect(config: NetworkConfig) -> Result<Self> {
        if let Err(errors) = validate_config(&config) {
            let reason = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::validation("config", reason));
        }

        let registry = ChainRegistry::from_config(&config);
        let chain_id = registry.chain_id(&config.chain_name)?;
        let evm = BlockchainClient::connect(&config, chain_id).await?;
        let chain = RestClient::from_config(&config)?;
        let keystore = MemoryKeyStore::new(config.bech32_prefix.clone());

        tracing::info!(
            chain = %config.chain_name,
            chain_id = chain_id,
            api_url = %config.api_url,
            evm_rpc_url = %config.evm_rpc_url,
            "Client connected"
        );

        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            evm: Arc::new(evm),
            chain: Arc::new(chain),
            keystore: Arc::new(keystore),
            nonces: NonceManager::new(),
        })
    }

    /// Assemble a client from existing handles.
    pub fn from_parts(
        config: NetworkConfig,
        evm: Arc<dyn EvmRpc>,
        chain: Arc<dyn ChainRpc>,
        keystore: Arc<dyn KeyStore>,
    ) -> Self {
        let registry = ChainRegistry::from_config(&config);
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            evm,
            chain,
            keystore,
            nonces: NonceManager::new(),
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn evm(&self) -> &Arc<dyn EvmRpc> {
        &self.evm
    }

    pub fn chain(&self) -> &Arc<dyn ChainRpc> {
        &self.chain
    }

    pub fn keystore(&self) -> &Arc<dyn KeyStore> {
        &self.keystore
    }

    pub fn nonces(&self) -> &NonceManager {
        &self.nonces
    }

    /// EVM chain id of the configured chain name.
    pub fn evm_chain_id(&self) -> Result<u64> {
        self.registry.chain_id(&self.config.chain_name)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("chain_name", &self.config.chain_name)
            .field("api_url", &self.config.api_url)
            .field("evm_rpc_url", &self.config.evm_rpc_url)
            .finish()
    }
}
