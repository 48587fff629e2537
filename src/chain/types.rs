//! Message-chain value types as returned by the node's REST gateway.

use serde::{Deserialize, Deserializer, Serialize};

/// How `broadcast` waits on the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastMode {
    /// Wait for the mempool check; the response code is meaningful.
    #[default]
    Sync,
    /// Return immediately; only the hash is meaningful.
    Async,
}

impl BroadcastMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "BROADCAST_MODE_SYNC",
            Self::Async => "BROADCAST_MODE_ASYNC",
        }
    }
}

/// Signer metadata resolved against the live chain before signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    /// Decimal integer string; amounts exceed `u64` on 18-decimal denoms.
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    /// Amount parsed as an integer. `None` if the node sent something else.
    pub fn amount_u128(&self) -> Option<u128> {
        self.amount.parse().ok()
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// `tx_response` as served by `/cosmos/tx/v1beta1/txs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxResponse {
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub height: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub gas_wanted: u64,
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub gas_used: u64,
}

/// Outcome of one message-chain broadcast. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxResult {
    /// Upper-case hex, as the chain reports it. Empty for dry runs.
    pub hash: String,
    pub code: u32,
    pub codespace: String,
    pub raw_log: String,
    pub gas_wanted: u64,
    pub gas_used: u64,
    /// Fee attached to the transaction.
    pub fee: Vec<Coin>,
    /// Zero until included.
    pub height: u64,
}

impl TxResult {
    /// Result of a dry run: success, nothing submitted.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    pub fn from_response(response: TxResponse, fee: Vec<Coin>) -> Self {
        Self {
            hash: response.txhash,
            code: response.code,
            codespace: response.codespace,
            raw_log: response.raw_log,
            gas_wanted: response.gas_wanted,
            gas_used: response.gas_used,
            fee,
            height: response.height,
        }
    }
}

/// The gateway encodes 64-bit integers as JSON strings; accept both.
pub(crate) fn u64_from_str_or_num<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) if s.is_empty() => Ok(0),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
