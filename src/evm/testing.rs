//! In-memory EVM node for unit tests.

use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::evm::rpc::EvmRpc;
use crate::evm::types::EvmReceipt;

// Anvil's first account.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[derive(Default)]
struct State {
    gas_estimate: u64,
    gas_price: u128,
    nonce: u64,
    call_result: Bytes,
    fail_estimate: Option<String>,
    fail_nonce: Option<String>,
    fail_send: Option<String>,
    sent: Vec<Bytes>,
    calls: Vec<TransactionRequest>,
    receipts: HashMap<TxHash, EvmReceipt>,
}

pub struct MockEvm {
    chain_id: u64,
    state: Mutex<State>,
}

impl MockEvm {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: Mutex::new(State {
                gas_estimate: 21_000,
                gas_price: 1_000_000_000,
                ..State::default()
            }),
        }
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.state.lock().unwrap().gas_estimate = gas;
    }

    pub fn set_gas_price(&self, price: u128) {
        self.state.lock().unwrap().gas_price = price;
    }

    pub fn set_nonce(&self, nonce: u64) {
        self.state.lock().unwrap().nonce = nonce;
    }

    pub fn set_call_result(&self, data: Bytes) {
        self.state.lock().unwrap().call_result = data;
    }

    pub fn fail_estimate(&self, reason: &str) {
        self.state.lock().unwrap().fail_estimate = Some(reason.to_string());
    }

    pub fn fail_nonce(&self, reason: &str) {
        self.state.lock().unwrap().fail_nonce = Some(reason.to_string());
    }

    pub fn fail_send(&self, reason: &str) {
        self.state.lock().unwrap().fail_send = Some(reason.to_string());
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn calls(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn insert_receipt(&self, receipt: EvmReceipt) {
        self.state.lock().unwrap().receipts.insert(receipt.tx_hash, receipt);
    }
}

#[async_trait]
impl EvmRpc for MockEvm {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(request);
        match &state.fail_estimate {
            Some(reason) => Err(Error::Rpc(reason.clone())),
            None => Ok(state.gas_estimate),
        }
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn pending_nonce(&self, _address: Address) -> Result<u64> {
        let state = self.state.lock().unwrap();
        match &state.fail_nonce {
            Some(reason) => Err(Error::Rpc(reason.clone())),
            None => Ok(state.nonce),
        }
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(request);
        Ok(state.call_result.clone())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.fail_send {
            return Err(Error::Rpc(reason.clone()));
        }
        let hash = keccak256(&raw);
        state.sent.push(raw);
        Ok(hash)
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<EvmReceipt>> {
        Ok(self.state.lock().unwrap().receipts.get(&hash).cloned())
    }

    async fn balance(&self, _address: Address) -> Result<U256> {
        Ok(U256::ZERO)
    }
}
