//! Status sources for both chains and the typed wait helpers built on them.

use alloy::primitives::TxHash;
use async_trait::async_trait;
use std::sync::Arc;

use crate::chain::rpc::ChainRpc;
use crate::chain::types::TxResponse;
use crate::config::PollConfig;
use crate::confirmation::cancel::CancelToken;
use crate::confirmation::poller::{Confirmation, PollStatus, Poller, StatusSource};
use crate::error::{Error, Result};
use crate::evm::rpc::EvmRpc;
use crate::evm::types::EvmReceipt;
use crate::observability::metrics::{self, ChainKind};

/// EVM receipts; a receipt with status 0 is a failure.
pub struct EvmReceiptSource {
    rpc: Arc<dyn EvmRpc>,
    hash: TxHash,
}

impl EvmReceiptSource {
    pub fn new(rpc: Arc<dyn EvmRpc>, hash: TxHash) -> Self {
        Self { rpc, hash }
    }
}

#[async_trait]
impl StatusSource for EvmReceiptSource {
    type Output = EvmReceipt;

    async fn poll_status(&self) -> Result<PollStatus<EvmReceipt>> {
        Ok(match self.rpc.receipt(self.hash).await? {
            None => PollStatus::Pending,
            Some(receipt) if receipt.status => PollStatus::Success(receipt),
            Some(receipt) => PollStatus::Failure(receipt),
        })
    }
}

/// Message-chain tx lookups; a non-zero code is a failure.
pub struct ChainTxSource {
    rpc: Arc<dyn ChainRpc>,
    hash: String,
}

impl ChainTxSource {
    pub fn new(rpc: Arc<dyn ChainRpc>, hash: impl Into<String>) -> Self {
        Self {
            rpc,
            hash: hash.into(),
        }
    }
}

#[async_trait]
impl StatusSource for ChainTxSource {
    type Output = TxResponse;

    async fn poll_status(&self) -> Result<PollStatus<TxResponse>> {
        Ok(match self.rpc.get_tx(&self.hash).await? {
            None => PollStatus::Pending,
            Some(response) if response.code == 0 => PollStatus::Success(response),
            Some(response) => PollStatus::Failure(response),
        })
    }
}

/// One receipt lookup, no waiting.
pub async fn evm_receipt(rpc: &dyn EvmRpc, hash: TxHash) -> Result<Option<EvmReceipt>> {
    rpc.receipt(hash).await
}

/// Wait for an EVM transaction to be mined.
///
/// Reverted transactions come back as `EvmTxFailed` with the receipt.
pub async fn wait_for_evm_transaction(
    rpc: Arc<dyn EvmRpc>,
    hash: TxHash,
    poll: &PollConfig,
    cancel: Option<&CancelToken>,
) -> Result<EvmReceipt> {
    let poller = Poller::from_config(poll);
    let outcome = poller.wait(&EvmReceiptSource::new(rpc, hash), cancel).await?;
    metrics::record_confirmation(ChainKind::Evm, outcome.outcome());

    match outcome {
        Confirmation::Confirmed(receipt) => {
            tracing::info!(
                tx_hash = %hash,
                block = ?receipt.block_number,
                gas_used = receipt.gas_used,
                "EVM transaction confirmed"
            );
            Ok(receipt)
        }
        Confirmation::Failed(receipt) => {
            tracing::warn!(tx_hash = %hash, gas_used = receipt.gas_used, "EVM transaction reverted");
            Err(Error::EvmTxFailed {
                receipt: Box::new(receipt),
            })
        }
        Confirmation::TimedOut => {
            tracing::warn!(tx_hash = %hash, "Timed out waiting for EVM receipt");
            Err(Error::ConfirmationTimeout {
                hash: hash.to_string(),
                waited_secs: poller.timeout().as_secs(),
            })
        }
        Confirmation::Cancelled => Err(Error::Cancelled(hash.to_string())),
    }
}

/// Wait for a message-chain transaction to be included.
///
/// A non-zero execution code comes back as `TxRejected`.
pub async fn wait_for_chain_transaction(
    rpc: Arc<dyn ChainRpc>,
    hash: &str,
    poll: &PollConfig,
    cancel: Option<&CancelToken>,
) -> Result<TxResponse> {
    let poller = Poller::from_config(poll);
    let outcome = poller.wait(&ChainTxSource::new(rpc, hash), cancel).await?;
    metrics::record_confirmation(ChainKind::Message, outcome.outcome());

    match outcome {
        Confirmation::Confirmed(response) => {
            tracing::info!(tx_hash = %hash, height = response.height, "Transaction included");
            Ok(response)
        }
        Confirmation::Failed(response) => Err(Error::TxRejected {
            code: response.code,
            raw_log: response.raw_log,
            hash: response.txhash,
        }),
        Confirmation::TimedOut => {
            tracing::warn!(tx_hash = %hash, "Timed out waiting for transaction");
            Err(Error::ConfirmationTimeout {
                hash: hash.to_string(),
                waited_secs: poller.timeout().as_secs(),
            })
        }
        Confirmation::Cancelled => Err(Error::Cancelled(hash.to_string())),
    }
}
