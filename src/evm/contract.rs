//! Certificate NFT contract calls.
//!
//! ABI for the functions this crate invokes, plus the builder operations
//! that pack and submit them.

use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::{SolCall, SolValue};

use crate::error::{Error, Result};
use crate::evm::rpc::EvmRpc;
use crate::evm::transaction::EvmTxBuilder;
use crate::evm::types::{Deployment, SignedEvmTx};

sol! {
    interface ICertificateNFT {
        function safeMint(address to, uint256 tokenId) external;
        function safeTransferFrom(address from, address to, uint256 tokenId) external;
        function burn(uint256 tokenId) external;
        function ownerOf(uint256 tokenId) external view returns (address);
        function nonces(address owner) external view returns (uint256);
        function permit(address spender, uint256 tokenId, uint256 deadline, uint8 v, bytes32 r, bytes32 s) external;
        function permitForAll(address owner, address operator, bool approved, uint256 deadline, uint8 v, bytes32 r, bytes32 s) external;
        function transferWithPermit(address from, address to, uint256 tokenId, uint256 deadline, uint8 v, bytes32 r, bytes32 s) external;
        function burnWithPermit(address owner, uint256 tokenId, uint256 deadline, uint8 v, bytes32 r, bytes32 s) external;
    }
}

/// ABI-encoded constructor arguments of the certificate contract:
/// `(string name, string symbol, string baseURI, string contractURI, address owner)`.
pub fn certificate_constructor_args(
    name: &str,
    symbol: &str,
    base_uri: &str,
    contract_uri: &str,
    owner: Address,
) -> Bytes {
    (
        name.to_string(),
        symbol.to_string(),
        base_uri.to_string(),
        contract_uri.to_string(),
        owner,
    )
        .abi_encode_params()
        .into()
}

async fn read_call(rpc: &dyn EvmRpc, contract: Address, data: Vec<u8>) -> Result<Bytes> {
    let request = TransactionRequest::default()
        .with_to(contract)
        .with_input(Bytes::from(data));
    rpc.call(request).await
}

/// Current owner of `token_id`. Reverts (burned or never minted) surface as `Rpc`.
pub async fn owner_of(rpc: &dyn EvmRpc, contract: Address, token_id: U256) -> Result<Address> {
    let data = ICertificateNFT::ownerOfCall { tokenId: token_id }.abi_encode();
    let out = read_call(rpc, contract, data).await?;
    Address::abi_decode(&out).map_err(|e| Error::Rpc(format!("ownerOf returned malformed data: {}", e)))
}

/// Permit nonce of `owner` on `contract`. Distinct from the account nonce;
/// it only moves when a permit is consumed.
pub async fn permit_nonce(rpc: &dyn EvmRpc, contract: Address, owner: Address) -> Result<U256> {
    let data = ICertificateNFT::noncesCall { owner }.abi_encode();
    let out = read_call(rpc, contract, data).await?;
    U256::abi_decode(&out).map_err(|e| Error::Rpc(format!("nonces returned malformed data: {}", e)))
}

impl EvmTxBuilder {
    /// Deploy `bytecode` with already-encoded constructor arguments appended.
    pub async fn deploy(&self, bytecode: Bytes, constructor_args: Bytes) -> Result<Deployment> {
        if bytecode.is_empty() {
            return Err(Error::PackingFailed {
                function: "constructor",
                reason: "contract bytecode is empty".to_string(),
            });
        }
        let mut data = bytecode.to_vec();
        data.extend_from_slice(&constructor_args);

        let signed = self.submit(TxKind::Create, data.into()).await?;
        let deployment = Deployment {
            tx_hash: signed.hash(),
            contract_address: self.address().create(signed.nonce()),
            nonce: signed.nonce(),
        };
        tracing::info!(
            tx_hash = %deployment.tx_hash,
            contract = %deployment.contract_address,
            "Contract deployment submitted"
        );
        Ok(deployment)
    }

    /// [`EvmTxBuilder::deploy`] taking hex bytecode as shipped in build artifacts.
    pub async fn deploy_hex(&self, bytecode_hex: &str, constructor_args: Bytes) -> Result<Deployment> {
        let bytecode = alloy::hex::decode(bytecode_hex.trim()).map_err(|e| Error::PackingFailed {
            function: "constructor",
            reason: format!("bytecode is not valid hex: {}", e),
        })?;
        self.deploy(bytecode.into(), constructor_args).await
    }

    pub async fn mint(&self, contract: Address, to: Address, token_id: U256) -> Result<SignedEvmTx> {
        let data = ICertificateNFT::safeMintCall { to, tokenId: token_id }.abi_encode();
        self.submit_call(contract, data.into()).await
    }

    /// Transfer a token owned by this signer.
    pub async fn transfer(&self, contract: Address, to: Address, token_id: U256) -> Result<SignedEvmTx> {
        let data = ICertificateNFT::safeTransferFromCall {
            from: self.address(),
            to,
            tokenId: token_id,
        }
        .abi_encode();
        self.submit_call(contract, data.into()).await
    }

    pub async fn burn(&self, contract: Address, token_id: U256) -> Result<SignedEvmTx> {
        let data = ICertificateNFT::burnCall { tokenId: token_id }.abi_encode();
        self.submit_call(contract, data.into()).await
    }

    pub async fn owner_of(&self, contract: Address, token_id: U256) -> Result<Address> {
        owner_of(self.rpc().as_ref(), contract, token_id).await
    }

    pub async fn permit_nonce(&self, contract: Address, owner: Address) -> Result<U256> {
        permit_nonce(self.rpc().as_ref(), contract, owner).await
    }
}
