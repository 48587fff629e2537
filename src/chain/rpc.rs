//! The message-chain node seam.

use async_trait::async_trait;
use serde_json::Value;

use crate::chain::types::{AccountInfo, BroadcastMode, Coin, TxResponse};
use crate::error::Result;

/// What the factory, broadcaster and bank client need from a node.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Account number and current sequence of `address`.
    async fn account(&self, address: &str) -> Result<AccountInfo>;

    /// Gas used when executing `tx_bytes` without committing.
    async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<u64>;

    /// Submit signed `tx_bytes`. A non-zero code in the response is not an
    /// `Err` here; the caller inspects it.
    async fn broadcast(&self, tx_bytes: Vec<u8>, mode: BroadcastMode) -> Result<TxResponse>;

    /// Look up an included transaction. `None` while not yet in a block.
    async fn get_tx(&self, hash: &str) -> Result<Option<TxResponse>>;

    async fn balances(&self, address: &str) -> Result<Vec<Coin>>;

    async fn balance_by_denom(&self, address: &str, denom: &str) -> Result<Coin>;

    /// Raw JSON from a module's query route, e.g.
    /// `/thesixnetwork/six-protocol/nftmngr/nft_schema/{code}`. `None` when
    /// the node has no such entry.
    async fn query_module_state(&self, path: &str) -> Result<Option<Value>>;
}
