//! EVM-side value types.

use alloy::consensus::{Signed, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionReceipt;

use crate::error::{Error, Result};

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// The parts of a mined transaction's receipt callers act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// False when the transaction reverted.
    pub status: bool,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub from: Address,
    pub to: Option<Address>,
    /// Set for contract deployments.
    pub contract_address: Option<Address>,
}

impl From<&TransactionReceipt> for EvmReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            status: receipt.status(),
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
            from: receipt.from,
            to: receipt.to,
            contract_address: receipt.contract_address,
        }
    }
}

/// A chain-id-bound, signed legacy transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedEvmTx {
    inner: Signed<TxLegacy>,
}

impl SignedEvmTx {
    pub fn new(inner: Signed<TxLegacy>) -> Self {
        Self { inner }
    }

    pub fn hash(&self) -> TxHash {
        *self.inner.hash()
    }

    pub fn tx(&self) -> &TxLegacy {
        self.inner.tx()
    }

    pub fn nonce(&self) -> u64 {
        self.inner.tx().nonce
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.inner.tx().chain_id
    }

    /// EIP-2718 wire bytes.
    pub fn raw(&self) -> Bytes {
        TxEnvelope::from(self.inner.clone()).encoded_2718().into()
    }

    /// Address that produced the signature.
    pub fn recover_signer(&self) -> Result<Address> {
        self.inner
            .signature()
            .recover_address_from_prehash(&self.inner.signature_hash())
            .map_err(|e| Error::SigningFailed {
                from: "unknown".to_string(),
                reason: format!("signature does not recover: {}", e),
            })
    }
}

/// Outcome of a contract deployment submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub tx_hash: TxHash,
    /// `CREATE` address computed from the sender and the nonce used.
    pub contract_address: Address,
    pub nonce: u64,
}
