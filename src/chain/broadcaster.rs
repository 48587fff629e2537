//! Submit-then-confirm for the message chain.

use cosmrs::Any;

use crate::chain::factory::TxFactory;
use crate::chain::types::TxResult;
use crate::confirmation::{wait_for_chain_transaction, CancelToken};
use crate::error::Result;

impl TxFactory {
    /// Broadcast `messages` and wait until the transaction is included.
    ///
    /// Returns the included result (height and gas used filled in). A dry
    /// run returns the empty result without waiting.
    pub async fn broadcast_and_wait(&self, messages: Vec<Any>, cancel: Option<&CancelToken>) -> Result<TxResult> {
        let submitted = self.broadcast(messages).await?;
        if submitted.hash.is_empty() {
            return Ok(submitted);
        }

        let included = wait_for_chain_transaction(self.rpc().clone(), &submitted.hash, self.poll(), cancel).await?;
        Ok(TxResult::from_response(included, submitted.fee))
    }
}
