//! Confirmation polling for both chains.
//!
//! # Data Flow
//! ```text
//! tx hash → sources.rs (EVM receipt | message-chain tx lookup)
//!     → poller.rs (fixed interval, absolute deadline, optional cancel)
//!     → Confirmed receipt | EvmTxFailed / TxRejected | ConfirmationTimeout | Cancelled
//! ```
//!
//! Nothing here resubmits. A timeout says only that inclusion was not seen.

pub mod cancel;
pub mod poller;
pub mod sources;

use alloy::primitives::TxHash;

use crate::chain::types::TxResponse;
use crate::error::Result;
use crate::evm::types::EvmReceipt;
use crate::identity::Client;

pub use cancel::CancelToken;
pub use poller::{Confirmation, PollStatus, Poller, StatusSource, MIN_POLL_INTERVAL};
pub use sources::{evm_receipt, wait_for_chain_transaction, wait_for_evm_transaction};

impl Client {
    /// Wait on the EVM node using the configured poll settings.
    pub async fn wait_for_evm_transaction(&self, hash: TxHash, cancel: Option<&CancelToken>) -> Result<EvmReceipt> {
        wait_for_evm_transaction(self.evm().clone(), hash, &self.config().poll, cancel).await
    }

    /// Wait on the message-chain node using the configured poll settings.
    pub async fn wait_for_chain_transaction(&self, hash: &str, cancel: Option<&CancelToken>) -> Result<TxResponse> {
        wait_for_chain_transaction(self.chain().clone(), hash, &self.config().poll, cancel).await
    }

    pub async fn evm_receipt(&self, hash: TxHash) -> Result<Option<EvmReceipt>> {
        evm_receipt(self.evm().as_ref(), hash).await
    }
}
