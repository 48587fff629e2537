//! Shared in-memory nodes for integration tests.
//!
//! `MockEvmNode` keeps per-account nonces and runs a small certificate
//! contract that verifies permits the way the deployed contract does:
//! recompute the typed-data digest with the current permit nonce, recover,
//! compare to the owner, check the deadline, then bump the nonce.
#![allow(dead_code)]

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, TxHash, TxKind, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::Signature;
use alloy::sol_types::{Eip712Domain, SolInterface, SolStruct, SolValue};
use async_trait::async_trait;
use cosmrs::tx::Msg;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use twinchain::chain::{AccountInfo, BroadcastMode, ChainRpc, Coin, TxResponse};
use twinchain::config::NetworkConfig;
use twinchain::error::{Error, Result};
use twinchain::evm::ICertificateNFT::ICertificateNFTCalls;
use twinchain::evm::{EvmReceipt, EvmRpc, Permit, PermitForAll, SignedEvmTx};
use twinchain::identity::Client;
use twinchain::keys::MemoryKeyStore;

pub const PHRASE: &str = "history perfect across group seek acoustic delay captain sauce audit carpet tattoo exhaust green there giant cluster want pond bulk close screen scissors remind";

/// Anvil's first and second accounts.
pub const OWNER_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ADMIN_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

pub const CHAIN_ID: u64 = 150;
pub const CONTRACT_NAME: &str = "MyNFTCert";
pub const START_TIME: u64 = 1_700_000_000;

#[derive(Clone, Default)]
struct Certificate {
    name: String,
    owners: HashMap<U256, Address>,
    approvals: HashMap<U256, Address>,
    operators: HashSet<(Address, Address)>,
    permit_nonces: HashMap<Address, U256>,
}

impl Certificate {
    fn domain(&self, chain_id: u64, contract: Address) -> Eip712Domain {
        Eip712Domain::new(
            Some(self.name.clone().into()),
            Some("1".into()),
            Some(U256::from(chain_id)),
            Some(contract),
            None,
        )
    }

    fn nonce(&self, owner: Address) -> U256 {
        self.permit_nonces.get(&owner).copied().unwrap_or_default()
    }

    fn owner(&self, token: U256) -> std::result::Result<Address, String> {
        self.owners
            .get(&token)
            .copied()
            .ok_or_else(|| "ERC721NonexistentToken".to_string())
    }

    fn may_move(&self, sender: Address, owner: Address, token: U256) -> bool {
        sender == owner
            || self.approvals.get(&token) == Some(&sender)
            || self.operators.contains(&(owner, sender))
    }

    #[allow(clippy::too_many_arguments)]
    fn consume<M: SolStruct>(
        &mut self,
        domain: &Eip712Domain,
        now: u64,
        owner: Address,
        message: &M,
        deadline: U256,
        v: u8,
        r: B256,
        s: B256,
    ) -> std::result::Result<(), String> {
        if U256::from(now) > deadline {
            return Err("permit expired".to_string());
        }
        let signature = Signature::new(U256::from_be_bytes(r.0), U256::from_be_bytes(s.0), v == 28);
        let recovered = signature
            .recover_address_from_prehash(&message.eip712_signing_hash(domain))
            .map_err(|_| "invalid signature".to_string())?;
        if recovered != owner {
            return Err("invalid signature".to_string());
        }
        *self.permit_nonces.entry(owner).or_default() += U256::from(1);
        Ok(())
    }

    fn execute(
        &mut self,
        domain: &Eip712Domain,
        now: u64,
        sender: Address,
        input: &[u8],
    ) -> std::result::Result<(), String> {
        let call = ICertificateNFTCalls::abi_decode(input).map_err(|e| format!("bad calldata: {}", e))?;
        match call {
            ICertificateNFTCalls::safeMint(c) => {
                if self.owners.contains_key(&c.tokenId) {
                    return Err("ERC721InvalidSender".to_string());
                }
                self.owners.insert(c.tokenId, c.to);
            }
            ICertificateNFTCalls::safeTransferFrom(c) => {
                let owner = self.owner(c.tokenId)?;
                if owner != c.from || !self.may_move(sender, owner, c.tokenId) {
                    return Err("ERC721InsufficientApproval".to_string());
                }
                self.approvals.remove(&c.tokenId);
                self.owners.insert(c.tokenId, c.to);
            }
            ICertificateNFTCalls::burn(c) => {
                let owner = self.owner(c.tokenId)?;
                if !self.may_move(sender, owner, c.tokenId) {
                    return Err("ERC721InsufficientApproval".to_string());
                }
                self.approvals.remove(&c.tokenId);
                self.owners.remove(&c.tokenId);
            }
            ICertificateNFTCalls::permit(c) => {
                let owner = self.owner(c.tokenId)?;
                let message = Permit {
                    owner,
                    spender: c.spender,
                    tokenId: c.tokenId,
                    nonce: self.nonce(owner),
                    deadline: c.deadline,
                };
                self.consume(domain, now, owner, &message, c.deadline, c.v, c.r, c.s)?;
                self.approvals.insert(c.tokenId, c.spender);
            }
            ICertificateNFTCalls::permitForAll(c) => {
                let message = PermitForAll {
                    owner: c.owner,
                    operator: c.operator,
                    approved: c.approved,
                    nonce: self.nonce(c.owner),
                    deadline: c.deadline,
                };
                self.consume(domain, now, c.owner, &message, c.deadline, c.v, c.r, c.s)?;
                if c.approved {
                    self.operators.insert((c.owner, c.operator));
                } else {
                    self.operators.remove(&(c.owner, c.operator));
                }
            }
            ICertificateNFTCalls::transferWithPermit(c) => {
                if self.owner(c.tokenId)? != c.from {
                    return Err("ERC721IncorrectOwner".to_string());
                }
                let message = Permit {
                    owner: c.from,
                    spender: sender,
                    tokenId: c.tokenId,
                    nonce: self.nonce(c.from),
                    deadline: c.deadline,
                };
                self.consume(domain, now, c.from, &message, c.deadline, c.v, c.r, c.s)?;
                self.approvals.remove(&c.tokenId);
                self.owners.insert(c.tokenId, c.to);
            }
            ICertificateNFTCalls::burnWithPermit(c) => {
                if self.owner(c.tokenId)? != c.owner {
                    return Err("ERC721IncorrectOwner".to_string());
                }
                let message = Permit {
                    owner: c.owner,
                    spender: sender,
                    tokenId: c.tokenId,
                    nonce: self.nonce(c.owner),
                    deadline: c.deadline,
                };
                self.consume(domain, now, c.owner, &message, c.deadline, c.v, c.r, c.s)?;
                self.approvals.remove(&c.tokenId);
                self.owners.remove(&c.tokenId);
            }
            ICertificateNFTCalls::ownerOf(_) | ICertificateNFTCalls::nonces(_) => {}
        }
        Ok(())
    }

    fn read(&self, input: &[u8]) -> std::result::Result<Bytes, String> {
        match ICertificateNFTCalls::abi_decode(input).map_err(|e| format!("bad calldata: {}", e))? {
            ICertificateNFTCalls::ownerOf(c) => Ok(self.owner(c.tokenId)?.abi_encode().into()),
            ICertificateNFTCalls::nonces(c) => Ok(self.nonce(c.owner).abi_encode().into()),
            _ => Err("not a view function".to_string()),
        }
    }
}

struct NodeState {
    block_time: u64,
    block_number: u64,
    account_nonces: HashMap<Address, u64>,
    certificates: HashMap<Address, Certificate>,
    receipts: HashMap<TxHash, EvmReceipt>,
    polls_before_mined: u32,
    pending: HashMap<TxHash, u32>,
    sent: Vec<SignedEvmTx>,
}

/// EVM node with real nonce accounting and a permit-verifying contract.
pub struct MockEvmNode {
    chain_id: u64,
    state: Mutex<NodeState>,
}

impl MockEvmNode {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: Mutex::new(NodeState {
                block_time: START_TIME,
                block_number: 1,
                account_nonces: HashMap::new(),
                certificates: HashMap::new(),
                receipts: HashMap::new(),
                polls_before_mined: 0,
                pending: HashMap::new(),
                sent: Vec::new(),
            }),
        }
    }

    /// Place a certificate contract at `address` without a deployment tx.
    pub fn install_certificate(&self, address: Address, name: &str) {
        self.state.lock().unwrap().certificates.insert(
            address,
            Certificate {
                name: name.to_string(),
                ..Certificate::default()
            },
        );
    }

    pub fn mint(&self, contract: Address, token: u64, owner: Address) {
        let mut state = self.state.lock().unwrap();
        state
            .certificates
            .get_mut(&contract)
            .expect("certificate installed")
            .owners
            .insert(U256::from(token), owner);
    }

    pub fn token_owner(&self, contract: Address, token: u64) -> Option<Address> {
        let state = self.state.lock().unwrap();
        state.certificates.get(&contract)?.owners.get(&U256::from(token)).copied()
    }

    pub fn permit_nonce(&self, contract: Address, owner: Address) -> U256 {
        let state = self.state.lock().unwrap();
        state
            .certificates
            .get(&contract)
            .map(|c| c.nonce(owner))
            .unwrap_or_default()
    }

    pub fn set_block_time(&self, time: u64) {
        self.state.lock().unwrap().block_time = time;
    }

    pub fn block_time(&self) -> u64 {
        self.state.lock().unwrap().block_time
    }

    /// Receipts stay hidden for this many lookups after submission.
    pub fn set_polls_before_mined(&self, polls: u32) {
        self.state.lock().unwrap().polls_before_mined = polls;
    }

    pub fn sent(&self) -> Vec<SignedEvmTx> {
        self.state.lock().unwrap().sent.clone()
    }

    fn dry_run(&self, from: Address, to: Option<TxKind>, input: &[u8]) -> std::result::Result<(), String> {
        let state = self.state.lock().unwrap();
        let Some(TxKind::Call(contract)) = to else {
            return Ok(());
        };
        let Some(certificate) = state.certificates.get(&contract) else {
            return Ok(());
        };
        let mut scratch = certificate.clone();
        let domain = scratch.domain(self.chain_id, contract);
        scratch.execute(&domain, state.block_time, from, input)
    }
}

#[async_trait]
impl EvmRpc for MockEvmNode {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> Result<u64> {
        let from = request.from.unwrap_or_default();
        let input = request.input.input().cloned().unwrap_or_default();
        self.dry_run(from, request.to, &input)
            .map_err(|reason| Error::Rpc(format!("execution reverted: {}", reason)))?;
        Ok(match request.to {
            Some(TxKind::Create) | None => 1_500_000,
            Some(TxKind::Call(_)) => 90_000,
        })
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(1_000_000_000)
    }

    async fn pending_nonce(&self, address: Address) -> Result<u64> {
        let nonce = self
            .state
            .lock()
            .unwrap()
            .account_nonces
            .get(&address)
            .copied()
            .unwrap_or_default();
        // Let other submissions interleave between fetch and send.
        tokio::task::yield_now().await;
        Ok(nonce)
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        let Some(TxKind::Call(contract)) = request.to else {
            return Err(Error::Rpc("call without target".to_string()));
        };
        let input = request.input.input().cloned().unwrap_or_default();
        let state = self.state.lock().unwrap();
        let certificate = state
            .certificates
            .get(&contract)
            .ok_or_else(|| Error::Rpc("no contract at address".to_string()))?;
        certificate
            .read(&input)
            .map_err(|reason| Error::Rpc(format!("execution reverted: {}", reason)))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<TxHash> {
        let envelope =
            TxEnvelope::decode_2718(&mut raw.as_ref()).map_err(|e| Error::Rpc(format!("rlp: {}", e)))?;
        let legacy = envelope
            .as_legacy()
            .ok_or_else(|| Error::Rpc("only legacy transactions accepted".to_string()))?;
        let signed = SignedEvmTx::new(legacy.clone());
        let from = signed.recover_signer()?;
        let tx = signed.tx().clone();

        if tx.chain_id != Some(self.chain_id) {
            return Err(Error::Rpc("invalid chain id for signer".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let expected = state.account_nonces.get(&from).copied().unwrap_or_default();
        if tx.nonce < expected {
            return Err(Error::Rpc("nonce too low".to_string()));
        }
        if tx.nonce > expected {
            return Err(Error::Rpc("nonce too high".to_string()));
        }
        state.account_nonces.insert(from, expected + 1);

        let (status, contract_address) = match tx.to {
            TxKind::Create => {
                let address = from.create(tx.nonce);
                state.certificates.insert(
                    address,
                    Certificate {
                        name: CONTRACT_NAME.to_string(),
                        ..Certificate::default()
                    },
                );
                (true, Some(address))
            }
            TxKind::Call(contract) => {
                let now = state.block_time;
                let status = match state.certificates.get_mut(&contract) {
                    Some(certificate) => {
                        let domain = certificate.domain(self.chain_id, contract);
                        certificate.execute(&domain, now, from, &tx.input).is_ok()
                    }
                    None => true,
                };
                (status, None)
            }
        };

        state.block_number += 1;
        let hash = signed.hash();
        let receipt = EvmReceipt {
            tx_hash: hash,
            block_number: Some(state.block_number),
            status,
            gas_used: 60_000,
            effective_gas_price: tx.gas_price,
            from,
            to: tx.to.to().copied(),
            contract_address,
        };
        state.receipts.insert(hash, receipt);
        let delay = state.polls_before_mined;
        state.pending.insert(hash, delay);
        state.sent.push(signed);
        Ok(hash)
    }

    async fn receipt(&self, hash: TxHash) -> Result<Option<EvmReceipt>> {
        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.pending.get_mut(&hash) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        Ok(state.receipts.get(&hash).cloned())
    }

    async fn balance(&self, _address: Address) -> Result<U256> {
        Ok(U256::from(10u64).pow(U256::from(18)))
    }
}

/// Message-chain node: tracks sequences and includes accepted transactions.
pub struct MockChainNode {
    state: Mutex<ChainState>,
}

struct ChainState {
    sequences: HashMap<String, u64>,
    balances: HashMap<String, Vec<Coin>>,
    txs: HashMap<String, (TxResponse, u32)>,
    lookups_before_inclusion: u32,
    broadcasts: Vec<Vec<u8>>,
}

impl MockChainNode {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                sequences: HashMap::new(),
                balances: HashMap::new(),
                txs: HashMap::new(),
                lookups_before_inclusion: 0,
                broadcasts: Vec::new(),
            }),
        }
    }

    pub fn set_balances(&self, address: &str, coins: Vec<Coin>) {
        self.state.lock().unwrap().balances.insert(address.to_string(), coins);
    }

    pub fn set_lookups_before_inclusion(&self, lookups: u32) {
        self.state.lock().unwrap().lookups_before_inclusion = lookups;
    }

    pub fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().broadcasts.clone()
    }
}

#[async_trait]
impl ChainRpc for MockChainNode {
    async fn account(&self, address: &str) -> Result<AccountInfo> {
        let sequence = self
            .state
            .lock()
            .unwrap()
            .sequences
            .get(address)
            .copied()
            .unwrap_or_default();
        // Let other broadcasts interleave between lookup and submission.
        tokio::task::yield_now().await;
        Ok(AccountInfo {
            account_number: 8,
            sequence,
        })
    }

    async fn simulate(&self, _tx_bytes: Vec<u8>) -> Result<u64> {
        Ok(120_000)
    }

    async fn broadcast(&self, tx_bytes: Vec<u8>, _mode: BroadcastMode) -> Result<TxResponse> {
        let tx = cosmrs::tx::Tx::from_bytes(&tx_bytes).map_err(|e| Error::Rpc(e.to_string()))?;
        let signer = &tx.auth_info.signer_infos[0];
        let sender = tx
            .body
            .messages
            .first()
            .and_then(|m| cosmrs::bank::MsgSend::from_any(m).ok())
            .map(|m| m.from_address.to_string())
            .unwrap_or_default();

        let mut state = self.state.lock().unwrap();
        let expected = state.sequences.get(&sender).copied().unwrap_or_default();
        let txhash = alloy::hex::encode_upper(keccak256(&tx_bytes));
        if signer.sequence != expected {
            return Ok(TxResponse {
                txhash,
                code: 32,
                codespace: "sdk".to_string(),
                raw_log: format!("account sequence mismatch, expected {}, got {}", expected, signer.sequence),
                ..TxResponse::default()
            });
        }
        state.sequences.insert(sender, expected + 1);
        state.broadcasts.push(tx_bytes);

        let included = TxResponse {
            txhash: txhash.clone(),
            height: 500,
            gas_wanted: tx.auth_info.fee.gas_limit,
            gas_used: 70_000,
            ..TxResponse::default()
        };
        let lookups = state.lookups_before_inclusion;
        state.txs.insert(txhash.clone(), (included, lookups));
        Ok(TxResponse {
            txhash,
            ..TxResponse::default()
        })
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

    async fn query_module_state(&self, _path: &str) -> Result<Option<serde_json::Value>> {
        Ok(None)
    }
}

/// Client on the `fivenet` preset wired to the given mock nodes.
pub fn client_with(evm: Arc<MockEvmNode>, chain: Arc<MockChainNode>) -> Client {
    Client::from_parts(
        NetworkConfig::testnet(),
        evm,
        chain,
        Arc::new(MemoryKeyStore::new("6x")),
    )
}

pub fn nodes() -> (Arc<MockEvmNode>, Arc<MockChainNode>, Client) {
    let evm = Arc::new(MockEvmNode::new(CHAIN_ID));
    let chain = Arc::new(MockChainNode::new());
    let client = client_with(evm.clone(), chain.clone());
    (evm, chain, client)
}
