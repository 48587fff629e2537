//! Transaction building, signing and submission for the EVM chain.
//!
//! # Responsibilities
//! - Estimate gas (with a buffer for deployments)
//! - Read the sender's pending nonce and the suggested gas price
//! - Sign with the chain-id-bound key
//! - Submit, or hand back the signed envelope without submitting
//!
//! Nothing here retries. A stale nonce or an underpriced transaction comes
//! back to the caller as an error.

use alloy::consensus::{SignableTransaction, TxLegacy};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::evm::nonce::NonceManager;
use crate::evm::rpc::EvmRpc;
use crate::evm::types::SignedEvmTx;
use crate::identity::{Client, EvmIdentity};
use crate::observability::metrics::{self, ChainKind};

/// Deployments are estimated at 120% of the node's figure.
pub const DEPLOY_GAS_BUFFER_PERCENT: u64 = 120;

/// Builds, signs and submits single-call transactions for one signer.
#[derive(Clone)]
pub struct EvmTxBuilder {
    signer: Arc<dyn EvmIdentity>,
    rpc: Arc<dyn EvmRpc>,
    nonces: NonceManager,
}

impl EvmTxBuilder {
    pub fn new(signer: Arc<dyn EvmIdentity>, rpc: Arc<dyn EvmRpc>, nonces: NonceManager) -> Self {
        Self { signer, rpc, nonces }
    }

    /// Builder sharing the client's EVM connection and nonce locks.
    pub fn from_client(signer: Arc<dyn EvmIdentity>, client: &Client) -> Self {
        Self::new(signer, client.evm().clone(), client.nonces().clone())
    }

    /// The sender, which is always the signer's own address.
    pub fn address(&self) -> Address {
        self.signer.evm_address()
    }

    pub fn chain_id(&self) -> u64 {
        self.signer.evm_chain_id()
    }

    pub fn rpc(&self) -> &Arc<dyn EvmRpc> {
        &self.rpc
    }

    /// Gas limit for `data` sent to `kind`.
    pub async fn estimate_gas(&self, kind: TxKind, data: &Bytes) -> Result<u64> {
        let mut request = TransactionRequest::default()
            .with_from(self.address())
            .with_input(data.clone());
        request.to = Some(kind);

        let estimate = self
            .rpc
            .estimate_gas(request)
            .await
            .map_err(|e| Error::GasEstimationFailed {
                from: self.address().to_string(),
                reason: e.to_string(),
            })?;

        Ok(match kind {
            TxKind::Create => estimate.saturating_mul(DEPLOY_GAS_BUFFER_PERCENT) / 100,
            TxKind::Call(_) => estimate,
        })
    }

    /// Assemble an unsigned transaction priced against the live chain.
    ///
    /// Reads the pending nonce every time; building twice without
    /// submitting returns the same nonce twice.
    pub async fn build(&self, kind: TxKind, data: Bytes) -> Result<TxLegacy> {
        let from = self.address();
        let gas_limit = self.estimate_gas(kind, &data).await?;

        let nonce = self
            .rpc
            .pending_nonce(from)
            .await
            .map_err(|e| Error::NonceFetchFailed {
                address: from.to_string(),
                reason: e.to_string(),
            })?;

        let gas_price = self
            .rpc
            .gas_price()
            .await
            .map_err(|e| Error::GasEstimationFailed {
                from: from.to_string(),
                reason: format!("gas price unavailable: {}", e),
            })?;

        tracing::debug!(
            from = %from,
            nonce = nonce,
            gas_limit = gas_limit,
            gas_price = gas_price,
            "EVM transaction built"
        );

        Ok(TxLegacy {
            chain_id: Some(self.chain_id()),
            nonce,
            gas_price,
            gas_limit,
            to: kind,
            value: U256::ZERO,
            input: data,
        })
    }

    /// Sign a built transaction with this builder's key.
    pub fn sign(&self, mut tx: TxLegacy) -> Result<SignedEvmTx> {
        let signature = self.signer.sign_evm_transaction(&mut tx)?;
        Ok(SignedEvmTx::new(tx.into_signed(signature)))
    }

    /// Build and sign without submitting.
    pub async fn build_signed(&self, kind: TxKind, data: Bytes) -> Result<SignedEvmTx> {
        let tx = self.build(kind, data).await?;
        self.sign(tx)
    }

    /// Submit an already signed transaction.
    pub async fn send_signed(&self, signed: &SignedEvmTx) -> Result<TxHash> {
        match self.rpc.send_raw_transaction(signed.raw()).await {
            Ok(hash) => {
                metrics::record_tx_submitted(ChainKind::Evm, true);
                tracing::info!(
                    from = %self.address(),
                    tx_hash = %hash,
                    nonce = signed.nonce(),
                    chain_id = self.chain_id(),
                    "EVM transaction submitted"
                );
                Ok(hash)
            }
            Err(e) => {
                metrics::record_tx_submitted(ChainKind::Evm, false);
                Err(Error::SubmissionFailed {
                    from: self.address().to_string(),
                    chain: self.chain_id().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Build, sign and submit, holding the sender's nonce lock throughout.
    pub async fn submit(&self, kind: TxKind, data: Bytes) -> Result<SignedEvmTx> {
        let _guard = self.nonces.lock(self.address()).await;
        let signed = self.build_signed(kind, data).await?;
        self.send_signed(&signed).await?;
        Ok(signed)
    }

    /// Submit a call to `to`.
    pub async fn submit_call(&self, to: Address, data: Bytes) -> Result<SignedEvmTx> {
        self.submit(TxKind::Call(to), data).await
    }

    /// Read-only call from this signer's address.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let request = TransactionRequest::default()
            .with_from(self.address())
            .with_to(to)
            .with_input(data);
        self.rpc.call(request).await
    }

    /// Native balance of this signer on the EVM side, in wei.
    pub async fn balance(&self) -> Result<U256> {
        self.rpc.balance(self.address()).await
    }
}

impl std::fmt::Debug for EvmTxBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmTxBuilder")
            .field("from", &self.address())
            .field("chain_id", &self.chain_id())
            .finish()
    }
}
