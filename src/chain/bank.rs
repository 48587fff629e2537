//! Balances and bank transfers.
//!
//! The same key is visible on the message chain under two addresses: the
//! chain-native one, and the Bech32 rendering of the EVM address bytes,
//! which is where the EVM-side denom is held.

use alloy::primitives::Address;
use cosmrs::bank::MsgSend;
use cosmrs::tx::Msg;
use cosmrs::AccountId;

use crate::chain::factory::TxFactory;
use crate::chain::types::{Coin, TxResult};
use crate::config::NetworkConfig;
use crate::confirmation::CancelToken;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct BankClient {
    factory: TxFactory,
    evm_address: Address,
    prefix: String,
    base_denom: String,
    evm_denom: String,
}

impl BankClient {
    pub fn new(factory: TxFactory, evm_address: Address, config: &NetworkConfig) -> Self {
        Self {
            factory,
            evm_address,
            prefix: config.bech32_prefix.clone(),
            base_denom: config.base_denom.clone(),
            evm_denom: config.evm_denom.clone(),
        }
    }

    fn chain_address(&self) -> Result<&str> {
        self.factory
            .signer()
            .chain_address()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::UninitializedSigner {
                label: self.factory.signer().key_label().to_string(),
            })
    }

    /// Bech32 rendering of the EVM address bytes.
    pub fn evm_account_address(&self) -> Result<String> {
        AccountId::new(&self.prefix, self.evm_address.as_slice())
            .map(|id| id.to_string())
            .map_err(|e| Error::Derivation(format!("bech32 encoding of EVM address failed: {}", e)))
    }

    /// Every balance held at the chain-native address.
    pub async fn balances(&self) -> Result<Vec<Coin>> {
        let address = self.chain_address()?;
        self.factory.rpc().balances(address).await
    }

    /// Base-denom balance at the chain-native address.
    pub async fn balance(&self) -> Result<Coin> {
        self.balance_of(&self.base_denom).await
    }

    /// EVM-denom balance, held at the Bech32 form of the EVM address.
    pub async fn evm_balance(&self) -> Result<Coin> {
        let address = self.evm_account_address()?;
        self.factory
            .rpc()
            .balance_by_denom(&address, &self.evm_denom)
            .await
    }

    pub async fn balance_of(&self, denom: &str) -> Result<Coin> {
        let address = self.chain_address()?;
        self.factory.rpc().balance_by_denom(address, denom).await
    }

    fn send_message(&self, to: &str, amount: &[Coin]) -> Result<cosmrs::Any> {
        if amount.is_empty() {
            return Err(Error::validation("amount", "must contain at least one coin"));
        }
        let from_address: AccountId = self
            .chain_address()?
            .parse()
            .map_err(|e| Error::validation("from", format!("{}", e)))?;
        let to_address: AccountId = to
            .parse()
            .map_err(|e| Error::validation("to", format!("invalid address '{}': {}", to, e)))?;

        let mut coins = Vec::with_capacity(amount.len());
        for coin in amount {
            let value = coin
                .amount_u128()
                .ok_or_else(|| Error::validation("amount", format!("'{}' is not an integer amount", coin.amount)))?;
            let denom = coin
                .denom
                .parse()
                .map_err(|e| Error::validation("amount", format!("invalid denom '{}': {}", coin.denom, e)))?;
            coins.push(cosmrs::Coin { denom, amount: value });
        }

        MsgSend {
            from_address,
            to_address,
            amount: coins,
        }
        .to_any()
        .map_err(|e| Error::BuildFailed {
            from: self.chain_address().unwrap_or_default().to_string(),
            gas: self.factory.gas_limit(),
            reason: e.to_string(),
        })
    }

    /// Send `amount` from the chain-native address to `to`.
    pub async fn send(&self, to: &str, amount: &[Coin]) -> Result<TxResult> {
        let msg = self.send_message(to, amount)?;
        self.factory.broadcast(vec![msg]).await
    }

    /// [`BankClient::send`] and wait for inclusion.
    pub async fn send_and_wait(&self, to: &str, amount: &[Coin], cancel: Option<&CancelToken>) -> Result<TxResult> {
        let msg = self.send_message(to, amount)?;
        self.factory.broadcast_and_wait(vec![msg], cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::testing::MockChain;
    use crate::evm::testing::{MockEvm, TEST_PRIVATE_KEY};
    use crate::identity::{Client, Identity};
    use crate::keys::keystore::MemoryKeyStore;
    use cosmrs::tx::Tx;
    use std::sync::Arc;

    const PHRASE: &str = "history perfect across group seek acoustic delay captain sauce audit carpet tattoo exhaust green there giant cluster want pond bulk close screen scissors remind";
    const BOB: &str = "6x169jj38rs6pka9cac7q8vy42k5lhjfujsurpkt8";

    fn setup() -> (Arc<MockChain>, Client, Identity) {
        let chain = Arc::new(MockChain::new());
        let client = Client::from_parts(
            NetworkConfig::testnet(),
            Arc::new(MockEvm::new(150)),
            chain.clone(),
            Arc::new(MemoryKeyStore::new("6x")),
        );
        let identity = Identity::create(&client, "alice", PHRASE, "testpassword").unwrap();
        (chain, client, identity)
    }

    #[tokio::test]
    async fn test_balances_by_address_kind() {
        let (chain, _, identity) = setup();
        let bank = identity.bank().unwrap();
        let native = identity.chain_address().unwrap();
        let evm_side = bank.evm_account_address().unwrap();
        assert!(evm_side.starts_with("6x1"));
        assert_ne!(evm_side, native);

        chain.set_balances(native, vec![Coin::new("usix", 500), Coin::new("uother", 1)]);
        chain.set_balances(&evm_side, vec![Coin::new("asix", 7_000_000_000_000_000_000)]);

        assert_eq!(bank.balances().await.unwrap().len(), 2);
        assert_eq!(bank.balance().await.unwrap(), Coin::new("usix", 500));
        assert_eq!(bank.balance_of("uother").await.unwrap().amount, "1");
        assert_eq!(
            bank.evm_balance().await.unwrap().amount_u128(),
            Some(7_000_000_000_000_000_000)
        );
    }

    #[tokio::test]
    async fn test_send_builds_msg_send() {
        let (chain, _, identity) = setup();
        let result = identity
            .bank()
            .unwrap()
            .send(BOB, &[Coin::new("usix", 1_000)])
            .await
            .unwrap();
        assert!(result.is_success());

        let tx = Tx::from_bytes(&chain.broadcasts()[0].0).unwrap();
        let msg = MsgSend::from_any(&tx.body.messages[0]).unwrap();
        assert_eq!(msg.to_address.to_string(), BOB);
        assert_eq!(msg.from_address.to_string(), identity.chain_address().unwrap());
        assert_eq!(msg.amount[0].amount, 1_000);
    }

    #[tokio::test]
    async fn test_send_validates_input() {
        let (chain, _, identity) = setup();
        let bank = identity.bank().unwrap();
        assert!(matches!(
            bank.send("not-an-address", &[Coin::new("usix", 1)]).await.unwrap_err(),
            Error::Validation { field: "to", .. }
        ));
        assert!(matches!(
            bank.send(BOB, &[]).await.unwrap_err(),
            Error::Validation { field: "amount", .. }
        ));
        assert!(chain.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn test_evm_only_identity_has_no_native_balance() {
        let (_, client, _) = setup();
        let imported = Identity::from_private_key(&client, "imported", TEST_PRIVATE_KEY).unwrap();
        let bank = imported.bank().unwrap();
        assert!(matches!(
            bank.balance().await.unwrap_err(),
            Error::UninitializedSigner { .. }
        ));
        assert!(bank.evm_balance().await.is_ok());
    }
}
