//! Typed-data permits: gasless authorizations signed by a token owner and
//! executed by whoever pays for gas.
//!
//! # Data Flow
//! ```text
//! owner side (PermitSigner)
//!     chain id + permit nonce (network)
//!     → domain {name, "1", chain id, contract} + message {owner, counterparty, subject, nonce, deadline}
//!     → keccak256(0x19 0x01 ‖ domain separator ‖ struct hash)
//!     → sign digest, v normalised to 27/28
//!     → SignedPermit (portable, no gas, no network needed to verify)
//!
//! broadcaster side (EvmTxBuilder)
//!     SignedPermit → scope checks → pack call → build/sign/submit with the broadcaster's key
//! ```
//!
//! # Security
//! - Every execution argument comes from the signed message; nothing the
//!   broadcaster passes can widen what the owner signed
//! - Signing never checks deadlines or nonces; the verifying contract does
//! - Replay protection is the contract's nonce, not duplicated here

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::signers::Signature;
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolCall, SolStruct};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::evm::contract::{permit_nonce, ICertificateNFT};
use crate::evm::rpc::EvmRpc;
use crate::evm::transaction::EvmTxBuilder;
use crate::evm::types::SignedEvmTx;
use crate::identity::{Client, EvmIdentity};
use crate::observability::metrics;

/// Version string fixed into every permit domain.
pub const PERMIT_DOMAIN_VERSION: &str = "1";

sol! {
    /// Approval of `spender` for a single token.
    #[derive(Debug, PartialEq, Eq)]
    struct Permit {
        address owner;
        address spender;
        uint256 tokenId;
        uint256 nonce;
        uint256 deadline;
    }

    /// Operator approval over all of the owner's tokens.
    #[derive(Debug, PartialEq, Eq)]
    struct PermitForAll {
        address owner;
        address operator;
        bool approved;
        uint256 nonce;
        uint256 deadline;
    }
}

/// Typed messages that can be signed as permits.
pub trait PermitMessage: SolStruct + Clone + Send + Sync {
    /// Label for logs and metrics.
    const KIND: &'static str;

    fn owner(&self) -> Address;
    fn nonce(&self) -> U256;
    fn deadline(&self) -> U256;
}

impl PermitMessage for Permit {
    const KIND: &'static str = "permit";

    fn owner(&self) -> Address {
        self.owner
    }

    fn nonce(&self) -> U256 {
        self.nonce
    }

    fn deadline(&self) -> U256 {
        self.deadline
    }
}

impl PermitMessage for PermitForAll {
    const KIND: &'static str = "permit_for_all";

    fn owner(&self) -> Address {
        self.owner
    }

    fn nonce(&self) -> U256 {
        self.nonce
    }

    fn deadline(&self) -> U256 {
        self.deadline
    }
}

/// Domain a permit is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitDomain {
    /// Contract display name, as passed to its constructor.
    pub name: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl PermitDomain {
    pub fn new(name: impl Into<String>, chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: name.into(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(self.name.clone().into()),
            Some(PERMIT_DOMAIN_VERSION.into()),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }
}

/// `keccak256(0x19 0x01 ‖ domainSeparator ‖ hashStruct(message))`.
pub fn permit_digest<M: SolStruct>(domain: &PermitDomain, message: &M) -> B256 {
    let mut buf = [0u8; 66];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(domain.eip712().separator().as_slice());
    buf[34..].copy_from_slice(message.eip712_hash_struct().as_slice());
    keccak256(buf)
}

/// The portable authorization handed to a broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitSignature {
    /// Recovery byte, 27 or 28.
    pub v: u8,
    pub r: B256,
    pub s: B256,
    pub deadline: U256,
}

impl PermitSignature {
    pub fn from_signature(signature: &Signature, deadline: U256) -> Self {
        Self {
            v: 27 + u8::from(signature.v()),
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
            deadline,
        }
    }

    pub fn to_signature(&self) -> Result<Signature> {
        let parity = match self.v {
            27 => false,
            28 => true,
            other => {
                return Err(Error::validation(
                    "permit.v",
                    format!("recovery byte must be 27 or 28, got {}", other),
                ))
            }
        };
        Ok(Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            parity,
        ))
    }
}

/// A signed message together with the domain it was signed under.
#[derive(Debug, Clone)]
pub struct SignedPermit<M> {
    pub domain: PermitDomain,
    pub message: M,
    pub signature: PermitSignature,
}

impl<M: PermitMessage> SignedPermit<M> {
    pub fn digest(&self) -> B256 {
        permit_digest(&self.domain, &self.message)
    }

    /// Address the signature recovers to under this domain and message.
    pub fn recover_signer(&self) -> Result<Address> {
        recover_permit_signer(&self.domain, &self.message, &self.signature)
    }

    /// True when the signature recovers to the message's owner.
    pub fn is_signed_by_owner(&self) -> bool {
        matches!(self.recover_signer(), Ok(addr) if addr == self.message.owner())
    }
}

/// Recover the signer of `signature` over `message` in `domain`.
pub fn recover_permit_signer<M: SolStruct>(
    domain: &PermitDomain,
    message: &M,
    signature: &PermitSignature,
) -> Result<Address> {
    let digest = permit_digest(domain, message);
    signature
        .to_signature()?
        .recover_address_from_prehash(&digest)
        .map_err(|e| Error::PermitScope(format!("signature does not recover: {}", e)))
}

/// Sign `message` under `domain` with no network access.
///
/// Deadlines and nonces are not checked; an already expired permit still
/// signs.
pub fn sign_permit_offline<M: PermitMessage>(
    owner: &dyn EvmIdentity,
    domain: PermitDomain,
    message: M,
) -> Result<SignedPermit<M>> {
    if message.owner() != owner.evm_address() {
        return Err(Error::PermitScope(format!(
            "message owner {} is not the signing key {}",
            message.owner(),
            owner.evm_address()
        )));
    }
    let digest = permit_digest(&domain, &message);
    let signature = owner.sign_evm_hash(&digest)?;
    let signature = PermitSignature::from_signature(&signature, message.deadline());

    metrics::record_permit_signed(M::KIND);
    tracing::info!(
        kind = M::KIND,
        owner = %message.owner(),
        contract = %domain.verifying_contract,
        chain_id = domain.chain_id,
        nonce = %message.nonce(),
        "Permit signed"
    );

    Ok(SignedPermit {
        domain,
        message,
        signature,
    })
}

/// Owner-side permit signing against live chain state.
#[derive(Clone)]
pub struct PermitSigner {
    owner: Arc<dyn EvmIdentity>,
    rpc: Arc<dyn EvmRpc>,
}

impl PermitSigner {
    pub fn new(owner: Arc<dyn EvmIdentity>, rpc: Arc<dyn EvmRpc>) -> Self {
        Self { owner, rpc }
    }

    pub fn from_client(owner: Arc<dyn EvmIdentity>, client: &Client) -> Self {
        Self::new(owner, client.evm().clone())
    }

    pub fn owner(&self) -> Address {
        self.owner.evm_address()
    }

    /// Chain id from the node and the owner's current permit nonce.
    async fn domain_and_nonce(&self, contract_name: &str, contract: Address) -> Result<(PermitDomain, U256)> {
        let chain_id = self.rpc.chain_id().await?;
        if chain_id != self.owner.evm_chain_id() {
            tracing::warn!(
                node_chain_id = chain_id,
                signer_chain_id = self.owner.evm_chain_id(),
                "Node chain id differs from the signer's; permit binds to the node's"
            );
        }
        let nonce = permit_nonce(self.rpc.as_ref(), contract, self.owner()).await?;
        Ok((PermitDomain::new(contract_name, chain_id, contract), nonce))
    }

    /// Authorize `spender` to act on `token_id` until `deadline`.
    pub async fn sign_permit(
        &self,
        contract_name: &str,
        contract: Address,
        spender: Address,
        token_id: U256,
        deadline: U256,
    ) -> Result<SignedPermit<Permit>> {
        let (domain, nonce) = self.domain_and_nonce(contract_name, contract).await?;
        let message = Permit {
            owner: self.owner(),
            spender,
            tokenId: token_id,
            nonce,
            deadline,
        };
        sign_permit_offline(self.owner.as_ref(), domain, message)
    }

    /// Grant or revoke `operator` over all tokens until `deadline`.
    pub async fn sign_permit_for_all(
        &self,
        contract_name: &str,
        contract: Address,
        operator: Address,
        approved: bool,
        deadline: U256,
    ) -> Result<SignedPermit<PermitForAll>> {
        let (domain, nonce) = self.domain_and_nonce(contract_name, contract).await?;
        let message = PermitForAll {
            owner: self.owner(),
            operator,
            approved,
            nonce,
            deadline,
        };
        sign_permit_offline(self.owner.as_ref(), domain, message)
    }
}

impl EvmTxBuilder {
    /// Checks every execution must pass before anything is packed.
    fn check_permit_scope<M: PermitMessage>(&self, signed: &SignedPermit<M>) -> Result<()> {
        if signed.domain.chain_id != self.chain_id() {
            return Err(Error::PermitScope(format!(
                "permit is bound to chain {} but broadcaster signs for chain {}",
                signed.domain.chain_id,
                self.chain_id()
            )));
        }
        if !signed.is_signed_by_owner() {
            return Err(Error::PermitScope(format!(
                "signature does not recover to owner {}",
                signed.message.owner()
            )));
        }
        Ok(())
    }

    fn require_spender(&self, signed: &SignedPermit<Permit>) -> Result<()> {
        if signed.message.spender != self.address() {
            return Err(Error::PermitScope(format!(
                "permit names spender {} but broadcaster is {}",
                signed.message.spender,
                self.address()
            )));
        }
        Ok(())
    }

    async fn execute_permit_call(&self, function: &'static str, contract: Address, data: Vec<u8>) -> Result<SignedEvmTx> {
        let signed = self.submit_call(contract, Bytes::from(data)).await?;
        tracing::info!(
            function,
            broadcaster = %self.address(),
            contract = %contract,
            tx_hash = %signed.hash(),
            "Permit executed"
        );
        Ok(signed)
    }

    /// Submit `permit(...)`; anyone may broadcast an approval.
    pub async fn permit(&self, signed: &SignedPermit<Permit>) -> Result<SignedEvmTx> {
        self.check_permit_scope(signed)?;
        let sig = &signed.signature;
        let data = ICertificateNFT::permitCall {
            spender: signed.message.spender,
            tokenId: signed.message.tokenId,
            deadline: sig.deadline,
            v: sig.v,
            r: sig.r,
            s: sig.s,
        }
        .abi_encode();
        self.execute_permit_call("permit", signed.domain.verifying_contract, data)
            .await
    }

    /// Submit `permitForAll(...)`; anyone may broadcast an operator approval.
    pub async fn permit_for_all(&self, signed: &SignedPermit<PermitForAll>) -> Result<SignedEvmTx> {
        self.check_permit_scope(signed)?;
        let sig = &signed.signature;
        let data = ICertificateNFT::permitForAllCall {
            owner: signed.message.owner,
            operator: signed.message.operator,
            approved: signed.message.approved,
            deadline: sig.deadline,
            v: sig.v,
            r: sig.r,
            s: sig.s,
        }
        .abi_encode();
        self.execute_permit_call("permitForAll", signed.domain.verifying_contract, data)
            .await
    }

    /// Move the permitted token from its owner to the permit's spender.
    ///
    /// The recipient is the signed `spender`; nothing outside the digest
    /// decides where the token goes. The broadcaster must be that spender.
    pub async fn transfer_with_permit(&self, signed: &SignedPermit<Permit>) -> Result<SignedEvmTx> {
        self.check_permit_scope(signed)?;
        self.require_spender(signed)?;
        let sig = &signed.signature;
        let data = ICertificateNFT::transferWithPermitCall {
            from: signed.message.owner,
            to: signed.message.spender,
            tokenId: signed.message.tokenId,
            deadline: sig.deadline,
            v: sig.v,
            r: sig.r,
            s: sig.s,
        }
        .abi_encode();
        self.execute_permit_call("transferWithPermit", signed.domain.verifying_contract, data)
            .await
    }

    /// Burn the permitted token. The broadcaster must be the permit's spender.
    pub async fn burn_with_permit(&self, signed: &SignedPermit<Permit>) -> Result<SignedEvmTx> {
        self.check_permit_scope(signed)?;
        self.require_spender(signed)?;
        let sig = &signed.signature;
        let data = ICertificateNFT::burnWithPermitCall {
            owner: signed.message.owner,
            tokenId: signed.message.tokenId,
            deadline: sig.deadline,
            v: sig.v,
            r: sig.r,
            s: sig.s,
        }
        .abi_encode();
        self.execute_permit_call("burnWithPermit", signed.domain.verifying_contract, data)
            .await
    }
}
