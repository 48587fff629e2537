//! REST gateway client for the message chain.
//!
//! Talks to the node's gRPC-gateway (`/cosmos/...` routes) over `reqwest`.
//! Every call is bounded by the configured RPC timeout. Failures surface as
//! `Error::Rpc`; nothing is retried here.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::chain::rpc::ChainRpc;
use crate::chain::types::{u64_from_str_or_num, AccountInfo, BroadcastMode, Coin, TxResponse};
use crate::config::NetworkConfig;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct GasInfo {
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    gas_used: u64,
}

#[derive(Deserialize)]
struct SimulateResponse {
    gas_info: GasInfo,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_response: TxResponse,
}

#[derive(Deserialize)]
struct BalancesResponse {
    #[serde(default)]
    balances: Vec<Coin>,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Option<Coin>,
}

#[derive(Deserialize)]
struct BaseAccount {
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    account_number: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    sequence: u64,
}

/// HTTP client for one node's REST gateway.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Rpc(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &NetworkConfig) -> Result<Self> {
        Self::new(&config.api_url, Duration::from_secs(config.rpc_timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        self.http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("GET {} failed: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.send_get(path, &[]).await?;
        Self::decode(path, resp).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("POST {} failed: {}", path, e)))?;
        Self::decode(path, resp).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Rpc(format!("{} returned unreadable body: {}", path, e)))?;

        if !status.is_success() {
            return Err(Error::Rpc(format!("{} returned {}: {}", path, status, text)));
        }

        serde_json::from_str(&text).map_err(|e| Error::Rpc(format!("{} returned malformed JSON: {}", path, e)))
    }
}

/// Pull account number and sequence from an `account` object. Plain
/// accounts carry them at the top level; EVM-compatible accounts nest them
/// under `base_account`.
fn parse_account(account: &Value) -> Result<AccountInfo> {
    let base = account.get("base_account").unwrap_or(account);
    let base: BaseAccount = serde_json::from_value(base.clone())
        .map_err(|e| Error::Rpc(format!("unrecognised account shape: {}", e)))?;
    Ok(AccountInfo {
        account_number: base.account_number,
        sequence: base.sequence,
    })
}

#[async_trait]
impl ChainRpc for RestClient {
    async fn account(&self, address: &str) -> Result<AccountInfo> {
        let body: Value = self
            .get_json(&format!("/cosmos/auth/v1beta1/accounts/{}", address))
            .await?;
        let account = body
            .get("account")
            .ok_or_else(|| Error::Rpc(format!("no account object for {}", address)))?;
        parse_account(account)
    }

    async fn simulate(&self, tx_bytes: Vec<u8>) -> Result<u64> {
        let body = json!({ "tx_bytes": BASE64.encode(tx_bytes) });
        let resp: SimulateResponse = self.post_json("/cosmos/tx/v1beta1/simulate", &body).await?;
        Ok(resp.gas_info.gas_used)
    }

    async fn broadcast(&self, tx_bytes: Vec<u8>, mode: BroadcastMode) -> Result<TxResponse> {
        let body = json!({
            "tx_bytes": BASE64.encode(tx_bytes),
            "mode": mode.as_str(),
        });
        let resp: BroadcastResponse = self.post_json("/cosmos/tx/v1beta1/txs", &body).await?;
        Ok(resp.tx_response)
    }

    async fn get_tx(&self, hash: &str) -> Result<Option<TxResponse>> {
        let path = format!("/cosmos/tx/v1beta1/txs/{}", hash);
        let resp = self.send_get(&path, &[]).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: BroadcastResponse = Self::decode(&path, resp).await?;
        Ok(Some(body.tx_response))
    }

    async fn balances(&self, address: &str) -> Result<Vec<Coin>> {
        let resp: BalancesResponse = self
            .get_json(&format!("/cosmos/bank/v1beta1/balances/{}", address))
            .await?;
        Ok(resp.balances)
    }

    async fn balance_by_denom(&self, address: &str, denom: &str) -> Result<Coin> {
        // IBC and factory denoms contain `/`, so the denom goes through the
        // query encoder rather than into the path.
        let path = format!("/cosmos/bank/v1beta1/balances/{}/by_denom", address);
        let resp = self.send_get(&path, &[("denom", denom)]).await?;
        let body: BalanceResponse = Self::decode(&path, resp).await?;
        Ok(body.balance.unwrap_or_else(|| Coin::zero(denom)))
    }

    async fn query_module_state(&self, path: &str) -> Result<Option<Value>> {
        if !path.starts_with('/') || path.contains("://") {
            return Err(Error::validation(
                "path",
                format!("module query path must be a route starting with '/', got '{}'", path),
            ));
        }
        let resp = self.send_get(path, &[]).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(path, resp).await.map(Some)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient").field("base_url", &self.base_url).finish()
    }
}
