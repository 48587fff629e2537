//! The EVM node seam.
//!
//! Everything the builders need from an EVM node, behind one object-safe
//! trait so tests can substitute an in-memory chain.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::error::Result;
use crate::evm::types::EvmReceipt;

#[async_trait]
pub trait EvmRpc: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> Result<u64>;

    /// `eth_estimateGas` for a call or deployment request.
    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64>;

    /// `eth_gasPrice`, in wei.
    async fn gas_price(&self) -> Result<u128>;

    /// `eth_getTransactionCount` at the `pending` block tag.
    async fn pending_nonce(&self, address: Address) -> Result<u64>;

    /// Read-only `eth_call`.
    async fn call(&self, request: TransactionRequest) -> Result<Bytes>;

    /// `eth_sendRawTransaction`.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash>;

    /// `eth_getTransactionReceipt`; `None` while not yet mined.
    async fn receipt(&self, hash: TxHash) -> Result<Option<EvmReceipt>>;

    /// `eth_getBalance` at latest, in wei.
    async fn balance(&self, address: Address) -> Result<U256>;
}
