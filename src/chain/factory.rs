//! Transaction factory for the message chain.
//!
//! # Responsibilities
//! - Hold per-broadcast settings (gas, price, memo, fee payer, modes)
//! - Resolve account number and sequence from the chain at submit time
//! - Optionally simulate to size gas
//! - Build, sign, encode and submit one multi-message transaction
//!
//! Every `with_*` setter returns a modified copy. A base factory can be
//! shared across tasks and specialised per call without any of them seeing
//! each other's settings.
//!
//! Copies built from one `Client` share its account locks: one broadcast per
//! signer is between sequence lookup and node check at a time.

use cosmrs::tendermint::chain::Id as ChainId;
use cosmrs::tx::{Body, Fee, SignDoc, SignerInfo};
use cosmrs::{AccountId, Any, Coin as CosmosCoin, Denom};
use std::sync::Arc;

use crate::chain::rpc::ChainRpc;
use crate::chain::types::{AccountInfo, BroadcastMode, Coin, TxResult};
use crate::config::{GasPrice, PollConfig};
use crate::error::{Error, Result};
use crate::evm::nonce::NonceManager;
use crate::identity::{ChainIdentity, Client};
use crate::observability::metrics::{self, ChainKind};

#[derive(Clone)]
pub struct TxFactory {
    signer: Arc<dyn ChainIdentity>,
    rpc: Arc<dyn ChainRpc>,
    chain_id: String,
    gas_limit: u64,
    gas_price: GasPrice,
    gas_adjustment: f64,
    memo: String,
    timeout_height: u32,
    fee_payer: Option<String>,
    fee_granter: Option<String>,
    account_number: Option<u64>,
    sequence: Option<u64>,
    simulate: bool,
    dry_run: bool,
    offline: bool,
    broadcast_mode: BroadcastMode,
    poll: PollConfig,
    sequences: NonceManager,
}

impl TxFactory {
    /// Factory for `signer` with the client's configured gas and poll defaults.
    pub fn from_client(signer: Arc<dyn ChainIdentity>, client: &Client) -> Result<Self> {
        let config = client.config();
        let gas_price = config
            .gas
            .gas_price
            .parse()
            .map_err(|e: String| Error::validation("gas_price", e))?;

        Ok(Self {
            signer,
            rpc: client.chain().clone(),
            chain_id: config.chain_name.clone(),
            gas_limit: config.gas.gas_limit,
            gas_price,
            gas_adjustment: config.gas.gas_adjustment,
            memo: String::new(),
            timeout_height: 0,
            fee_payer: None,
            fee_granter: None,
            account_number: None,
            sequence: None,
            simulate: false,
            dry_run: false,
            offline: false,
            broadcast_mode: BroadcastMode::Sync,
            poll: config.poll.clone(),
            sequences: client.nonces().clone(),
        })
    }

    fn with(&self, apply: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        apply(&mut next);
        next
    }

    pub fn with_chain_id(&self, chain_id: impl Into<String>) -> Self {
        let chain_id = chain_id.into();
        self.with(|f| f.chain_id = chain_id)
    }

    pub fn with_gas(&self, gas_limit: u64) -> Self {
        self.with(|f| f.gas_limit = gas_limit)
    }

    /// Parse and set the gas price, e.g. `1.25usix`.
    pub fn with_gas_price(&self, gas_price: &str) -> Result<Self> {
        let price: GasPrice = gas_price
            .parse()
            .map_err(|e: String| Error::validation("gas_price", e))?;
        Ok(self.with(|f| f.gas_price = price))
    }

    /// Multiplier applied to simulated gas. Must be finite and positive.
    pub fn with_gas_adjustment(&self, adjustment: f64) -> Result<Self> {
        if !adjustment.is_finite() || adjustment <= 0.0 {
            return Err(Error::validation(
                "gas_adjustment",
                format!("must be a positive number, got {}", adjustment),
            ));
        }
        Ok(self.with(|f| f.gas_adjustment = adjustment))
    }

    pub fn with_memo(&self, memo: impl Into<String>) -> Self {
        let memo = memo.into();
        self.with(|f| f.memo = memo)
    }

    pub fn with_timeout_height(&self, height: u32) -> Self {
        self.with(|f| f.timeout_height = height)
    }

    pub fn with_fee_payer(&self, payer: impl Into<String>) -> Self {
        let payer = payer.into();
        self.with(|f| f.fee_payer = Some(payer))
    }

    pub fn with_fee_granter(&self, granter: impl Into<String>) -> Self {
        let granter = granter.into();
        self.with(|f| f.fee_granter = Some(granter))
    }

    /// Pin account number and sequence instead of reading them from the chain.
    pub fn with_account(&self, account_number: u64, sequence: u64) -> Self {
        self.with(|f| {
            f.account_number = Some(account_number);
            f.sequence = Some(sequence);
        })
    }

    /// Size gas by simulation times the adjustment factor.
    pub fn with_simulate(&self, simulate: bool) -> Self {
        self.with(|f| f.simulate = simulate)
    }

    /// Stop before submission and return an empty result.
    pub fn with_dry_run(&self, dry_run: bool) -> Self {
        self.with(|f| f.dry_run = dry_run)
    }

    /// No chain access for preparation; account and sequence must be pinned.
    pub fn with_offline(&self, offline: bool) -> Self {
        self.with(|f| f.offline = offline)
    }

    pub fn with_broadcast_mode(&self, mode: BroadcastMode) -> Self {
        self.with(|f| f.broadcast_mode = mode)
    }

    pub fn with_poll(&self, poll: PollConfig) -> Self {
        self.with(|f| f.poll = poll)
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn gas_price(&self) -> &GasPrice {
        &self.gas_price
    }

    pub fn gas_adjustment(&self) -> f64 {
        self.gas_adjustment
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn broadcast_mode(&self) -> BroadcastMode {
        self.broadcast_mode
    }

    pub fn poll(&self) -> &PollConfig {
        &self.poll
    }

    pub fn rpc(&self) -> &Arc<dyn ChainRpc> {
        &self.rpc
    }

    pub fn signer(&self) -> &Arc<dyn ChainIdentity> {
        &self.signer
    }

    /// Fee owed at `gas` under the current price.
    pub fn fee_for(&self, gas: u64) -> Coin {
        Coin::new(self.gas_price.denom.clone(), self.gas_price.fee_for(gas))
    }

    /// Account number and sequence for `address`, from overrides or the chain.
    async fn prepare(&self, address: &str) -> Result<AccountInfo> {
        let prepare_failed = |reason: String| Error::FactoryPrepareFailed {
            address: address.to_string(),
            reason,
        };

        if let (Some(account_number), Some(sequence)) = (self.account_number, self.sequence) {
            return Ok(AccountInfo {
                account_number,
                sequence,
            });
        }
        if self.offline {
            return Err(prepare_failed(
                "offline mode requires a pinned account number and sequence".to_string(),
            ));
        }

        let live = self
            .rpc
            .account(address)
            .await
            .map_err(|e| prepare_failed(e.to_string()))?;
        Ok(AccountInfo {
            account_number: self.account_number.unwrap_or(live.account_number),
            sequence: self.sequence.unwrap_or(live.sequence),
        })
    }

    fn build_fee(&self, from: &str, gas: u64) -> Result<Fee> {
        let build_failed = |reason: String| Error::BuildFailed {
            from: from.to_string(),
            gas,
            reason,
        };

        let denom: Denom = self
            .gas_price
            .denom
            .parse()
            .map_err(|e| build_failed(format!("invalid fee denom: {}", e)))?;
        let parse_account = |addr: &Option<String>| -> Result<Option<AccountId>> {
            addr.as_deref()
                .map(|a| a.parse::<AccountId>())
                .transpose()
                .map_err(|e| build_failed(format!("invalid fee account: {}", e)))
        };

        Ok(Fee {
            amount: vec![CosmosCoin {
                denom,
                amount: self.gas_price.fee_for(gas),
            }],
            gas_limit: gas,
            payer: parse_account(&self.fee_payer)?,
            granter: parse_account(&self.fee_granter)?,
        })
    }

    /// Steps shared by simulation and submission: build, sign, encode.
    fn sign_and_encode(&self, messages: &[Any], from: &str, account: AccountInfo, gas: u64) -> Result<Vec<u8>> {
        let build_failed = |reason: String| Error::BuildFailed {
            from: from.to_string(),
            gas,
            reason,
        };

        let public_key = self
            .signer
            .chain_public_key()
            .map_err(|e| build_failed(e.to_string()))?;
        let body = Body::new(messages.to_vec(), self.memo.clone(), self.timeout_height);
        let auth_info = SignerInfo::single_direct(Some(public_key), account.sequence).auth_info(self.build_fee(from, gas)?);
        let chain_id: ChainId = self
            .chain_id
            .parse()
            .map_err(|e| build_failed(format!("invalid chain id '{}': {}", self.chain_id, e)))?;
        let sign_doc = SignDoc::new(&body, &auth_info, &chain_id, account.account_number)
            .map_err(|e| build_failed(e.to_string()))?;

        let raw = self.signer.sign_chain_doc(sign_doc).map_err(|e| match e {
            e @ Error::SigningFailed { .. } => e,
            other => Error::SigningFailed {
                from: from.to_string(),
                reason: other.to_string(),
            },
        })?;

        raw.to_bytes().map_err(|e| Error::EncodingFailed(e.to_string()))
    }

    /// Build, sign and submit `messages` as one transaction.
    ///
    /// A transaction the node accepts but checks with a non-zero code comes
    /// back as `TxRejected`, not as a transport error.
    pub async fn broadcast(&self, messages: Vec<Any>) -> Result<TxResult> {
        if messages.is_empty() {
            return Err(Error::NoMessages);
        }
        let from = match self.signer.chain_address() {
            Some(address) if !address.is_empty() => address.to_string(),
            _ => {
                return Err(Error::UninitializedSigner {
                    label: self.signer.key_label().to_string(),
                })
            }
        };

        // Held until the node has checked the signed sequence.
        let _sequence_guard = self.sequences.lock_account(&from).await;
        let account = self.prepare(&from).await?;

        let gas = if self.simulate {
            if self.offline {
                return Err(Error::OfflineSimulationUnavailable);
            }
            let candidate = self.sign_and_encode(&messages, &from, account, self.gas_limit)?;
            let simulated = self
                .rpc
                .simulate(candidate)
                .await
                .map_err(|e| Error::GasEstimationFailed {
                    from: from.clone(),
                    reason: e.to_string(),
                })?;
            let adjusted = (simulated as f64 * self.gas_adjustment).ceil() as u64;
            tracing::debug!(from = %from, simulated, adjusted, "Gas simulated");
            adjusted
        } else {
            self.gas_limit
        };

        if self.dry_run {
            tracing::debug!(from = %from, gas, messages = messages.len(), "Dry run, not submitting");
            return Ok(TxResult::empty());
        }

        let tx_bytes = self.sign_and_encode(&messages, &from, account, gas)?;

        let response = match self.rpc.broadcast(tx_bytes, self.broadcast_mode).await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_tx_submitted(ChainKind::Message, false);
                return Err(Error::SubmissionFailed {
                    from,
                    chain: self.chain_id.clone(),
                    reason: e.to_string(),
                });
            }
        };

        let result = TxResult::from_response(response, vec![self.fee_for(gas)]);
        metrics::record_tx_submitted(ChainKind::Message, result.is_success());

        if !result.is_success() {
            tracing::warn!(
                from = %from,
                tx_hash = %result.hash,
                code = result.code,
                raw_log = %result.raw_log,
                "Transaction rejected"
            );
            return Err(Error::TxRejected {
                code: result.code,
                raw_log: result.raw_log,
                hash: result.hash,
            });
        }

        tracing::info!(
            from = %from,
            tx_hash = %result.hash,
            sequence = account.sequence,
            gas,
            mode = self.broadcast_mode.as_str(),
            "Transaction broadcast"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for TxFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxFactory")
            .field("signer", &self.signer.key_label())
            .field("chain_id", &self.chain_id)
            .field("gas_limit", &self.gas_limit)
            .field("gas_price", &self.gas_price)
            .field("gas_adjustment", &self.gas_adjustment)
            .field("memo", &self.memo)
            .field("simulate", &self.simulate)
            .field("dry_run", &self.dry_run)
            .field("offline", &self.offline)
            .field("broadcast_mode", &self.broadcast_mode)
            .finish()
    }
}
