//! In-memory message-chain node for unit tests.

use alloy::primitives::keccak256;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::chain::rpc::ChainRpc;
use crate::chain::types::{AccountInfo, BroadcastMode, Coin, TxResponse};
use crate::error::{Error, Result};

struct State {
    account: AccountInfo,
    simulated_gas: u64,
    check_code: u32,
    check_log: String,
    deliver_code: u32,
    lookups_before_inclusion: u32,
    fail_account: Option<String>,
    fail_simulate: Option<String>,
    fail_broadcast: Option<String>,
    simulations: Vec<Vec<u8>>,
    broadcasts: Vec<(Vec<u8>, BroadcastMode)>,
    txs: HashMap<String, (TxResponse, u32)>,
    balances: HashMap<String, Vec<Coin>>,
    module_state: HashMap<String, Value>,
}

pub struct MockChain {
    state: Mutex<State>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                account: AccountInfo {
                    account_number: 12,
                    sequence: 3,
                },
                simulated_gas: 80_000,
                check_code: 0,
                check_log: String::new(),
                deliver_code: 0,
                lookups_before_inclusion: 0,
                fail_account: None,
                fail_simulate: None,
                fail_broadcast: None,
                simulations: Vec::new(),
                broadcasts: Vec::new(),
                txs: HashMap::new(),
                balances: HashMap::new(),
                module_state: HashMap::new(),
            }),
        }
    }

    pub fn set_module_state(&self, path: &str, value: Value) {
        self.state.lock().unwrap().module_state.insert(path.to_string(), value);
    }

    pub fn set_account(&self, account_number: u64, sequence: u64) {
        self.state.lock().unwrap().account = AccountInfo {
            account_number,
            sequence,
        };
    }

    pub fn set_simulated_gas(&self, gas: u64) {
        self.state.lock().unwrap().simulated_gas = gas;
    }

    /// Code returned synchronously by `broadcast`.
    pub fn set_check_code(&self, code: u32, log: &str) {
        let mut state = self.state.lock().unwrap();
        state.check_code = code;
        state.check_log = log.to_string();
    }

    /// Code the transaction executes with once included.
    pub fn set_deliver_code(&self, code: u32) {
        self.state.lock().unwrap().deliver_code = code;
    }

    pub fn set_lookups_before_inclusion(&self, lookups: u32) {
        self.state.lock().unwrap().lookups_before_inclusion = lookups;
    }

    pub fn set_balances(&self, address: &str, coins: Vec<Coin>) {
        self.state.lock().unwrap().balances.insert(address.to_string(), coins);
    }

    pub fn fail_account(&self, reason: &str) {
        self.state.lock().unwrap().fail_account = Some(reason.to_string());
    }

    pub fn fail_simulate(&self, reason: &str) {
        self.state.lock().unwrap().fail_simulate = Some(reason.to_string());
    }

    pub fn fail_broadcast(&self, reason: &str) {
        self.state.lock().unwrap().fail_broadcast = Some(reason.to_string());
    }

    pub fn simulations(&self) -> usize {
        self.state.lock().unwrap().simulations.len()
    }

    pub fn broadcasts(&self) -> Vec<(Vec<u8>, BroadcastMode)> {
        self.state.lock().unwrap().broadcasts.clone()
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn account(&self, _address: &str) -> Result<AccountInfo> {
        let state = self.state.lock().unwrap();
        match &state.fail_account {
            Some(reason) => Err(Error::Rpc(reason.clone())),
            None => Ok(state.account),
        }
    }

    async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.fail_simulate {
            return Err(Error::Rpc(reason.clone()));
        }
        state.simulations.push(tx_bytes);
        Ok(state.simulated_gas)
    }

    async fn broadcast(&self, tx_bytes: Vec<u8>, mode: BroadcastMode) -> Result<TxResponse> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.fail_broadcast {
            return Err(Error::Rpc(reason.clone()));
        }
        let txhash = alloy::hex::encode_upper(keccak256(&tx_bytes));
        state.broadcasts.push((tx_bytes, mode));

        let response = TxResponse {
            txhash: txhash.clone(),
            code: state.check_code,
            raw_log: state.check_log.clone(),
            ..TxResponse::default()
        };
        if state.check_code == 0 {
            let included = TxResponse {
                txhash: txhash.clone(),
                code: state.deliver_code,
                raw_log: if state.deliver_code == 0 {
                    String::new()
                } else {
                    "out of gas".to_string()
                },
                height: 100,
                gas_wanted: 200_000,
                gas_used: 81_000,
                ..TxResponse::default()
            };
            let lookups = state.lookups_before_inclusion;
            state.txs.insert(txhash, (included, lookups));
        }
        Ok(response)
    }

    async fn get_tx(&self, hash: &str) -> Result<Option<TxResponse>> {
        let mut state = self.state.lock().unwrap();
        match state.txs.get_mut(hash) {
            Some((_, remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Ok(None)
            }
            Some((response, _)) => Ok(Some(response.clone())),
            None => Ok(None),
        }
    }

    async fn balances(&self, address: &str) -> Result<Vec<Coin>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .balances
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn balance_by_denom(&self, address: &str, denom: &str) -> Result<Coin> {
        let coins = self.balances(address).await?;
        Ok(coins
            .into_iter()
            .find(|c| c.denom == denom)
            .unwrap_or_else(|| Coin::zero(denom)))
    }

    async fn query_module_state(&self, path: &str) -> Result<Option<Value>> {
        Ok(self.state.lock().unwrap().module_state.get(path).cloned())
    }
}
