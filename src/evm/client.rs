//! EVM JSON-RPC client with timeout and failover handling.
//!
//! # Responsibilities
//! - Connect to the primary JSON-RPC endpoint plus optional failovers
//! - Serve read-only queries from the first endpoint that answers
//! - Fail over on transport trouble only; a JSON-RPC error response such as
//!   a revert is the chain's answer and is returned as-is
//! - Send nonce lookups and raw transactions to the primary only
//! - Surface every transport failure to the caller

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::evm::rpc::EvmRpc;
use crate::evm::types::{ChainId, EvmReceipt};
use crate::observability::metrics;

/// EVM RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary first, then failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    rpc_url: String,
    expected_chain_id: u64,
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Build a client without touching the network.
    pub fn new(config: &NetworkConfig, expected_chain_id: u64) -> Result<Self> {
        let mut providers = Vec::new();

        let primary_url: url::Url = config.evm_rpc_url.parse().map_err(|e| {
            Error::Rpc(format!("Invalid EVM RPC URL '{}': {}", config.evm_rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>);

        for url_str in &config.evm_failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        Ok(Self {
            providers,
            rpc_url: config.evm_rpc_url.clone(),
            expected_chain_id,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    /// Build a client and check the node's chain id.
    ///
    /// An unreachable node only logs a warning. A node reporting a different
    /// chain id is an error, since every transaction signed for it would be
    /// rejected.
    pub async fn connect(config: &NetworkConfig, expected_chain_id: u64) -> Result<Self> {
        let client = Self::new(config, expected_chain_id)?;

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %client.rpc_url,
                    chain_id = expected_chain_id,
                    "EVM client initialized"
                );
            }
            Err(e @ Error::ChainMismatch { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "EVM client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> Result<()> {
        let actual = ChainId(self.chain_id().await?);
        if actual.0 != self.expected_chain_id {
            return Err(Error::ChainMismatch {
                expected: self.expected_chain_id,
                actual: actual.0,
            });
        }
        Ok(())
    }

    /// Run a read-only call against each provider in turn until one answers.
    ///
    /// Timeouts and transport errors move on to the next provider. An error
    /// response from the node is deterministic (every replica would revert the
    /// same call), so it ends the search.
    async fn read<T, F, Fut>(&self, method: &'static str, call: F) -> Result<T>
    where
        F: Fn(Arc<dyn Provider + Send + Sync>) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut last_error = String::from("no providers configured");
        for (i, provider) in self.providers.iter().enumerate() {
            if i > 0 {
                metrics::record_rpc_failover(method);
            }
            match timeout(self.timeout_duration, call(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) if e.is_error_resp() => {
                    tracing::debug!(provider_idx = i, method, error = %e, "Node answered with an error");
                    return Err(Error::Rpc(format!("{} failed: {}", method, e)));
                }
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, method, error = %e, "RPC error, trying next provider");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, method, "RPC timeout, trying next provider");
                    last_error = format!("timeout after {}s", self.timeout_duration.as_secs());
                }
            }
        }
        Err(Error::Rpc(format!("All RPC providers failed for {}: {}", method, last_error)))
    }

    /// Run a call against the primary provider only.
    async fn primary<T, E, Fut>(&self, method: &'static str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(Error::Rpc(format!("{} failed: {}", method, e))),
            Err(_) => Err(Error::Rpc(format!(
                "{} timed out after {}s",
                method,
                self.timeout_duration.as_secs()
            ))),
        }
    }

    /// Get the underlying primary provider.
    pub fn provider(&self) -> &(dyn Provider + Send + Sync) {
        self.providers[0].as_ref()
    }

    pub fn expected_chain_id(&self) -> u64 {
        self.expected_chain_id
    }
}

#[async_trait]
impl EvmRpc for BlockchainClient {
    async fn chain_id(&self) -> Result<u64> {
        self.read("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64> {
        self.read("eth_estimateGas", |p| {
            let request = request.clone();
            async move { p.estimate_gas(request).await }
        })
        .await
    }

    async fn gas_price(&self) -> Result<u128> {
        self.read("eth_gasPrice", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        let provider = self.providers[0].clone();
        self.primary("eth_getTransactionCount", async move {
            provider.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        self.read("eth_call", |p| {
            let request = request.clone();
            async move { p.call(request).await }
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash> {
        let provider = self.providers[0].clone();
        self.primary("eth_sendRawTransaction", async move {
            provider
                .send_raw_transaction(&raw)
                .await
                .map(|pending| *pending.tx_hash())
        })
        .await
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<EvmReceipt>> {
        let receipt = self
            .read("eth_getTransactionReceipt", |p| async move {
                p.get_transaction_receipt(hash).await
            })
            .await?;
        Ok(receipt.as_ref().map(EvmReceipt::from))
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.read("eth_getBalance", |p| async move { p.get_balance(address).await })
            .await
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.rpc_url)
            .field("providers", &self.providers.len())
            .field("chain_id", &self.expected_chain_id)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
