//! Per-signer serialization of nonce-consuming submissions.
//!
//! The node's pending nonce is the only counter. This module never caches or
//! increments it; it only guarantees that one submission per sender is
//! between "fetch pending nonce" and "node accepted the raw tx" at a time, so
//! two concurrent operations from one identity cannot pick the same nonce.
//!
//! Message-chain sequences get the same treatment, keyed by Bech32 address:
//! the factory holds the account lock from the sequence lookup until the
//! node has checked the signed transaction.

use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async lock per EVM sender and per message-chain account.
#[derive(Clone, Default)]
pub struct NonceManager {
    locks: Arc<DashMap<Address, Arc<Mutex<()>>>>,
    accounts: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Held for the duration of one fetch-sign-submit sequence.
pub type NonceGuard = OwnedMutexGuard<()>;

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other submission from `address` is in flight.
    pub async fn lock(&self, address: Address) -> NonceGuard {
        let lock = self
            .locks
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Wait until no other broadcast from the message-chain `address` is
    /// between sequence lookup and submission.
    pub async fn lock_account(&self, address: &str) -> NonceGuard {
        let lock = self
            .accounts
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Number of EVM senders seen so far.
    pub fn tracked_senders(&self) -> usize {
        self.locks.len()
    }

    /// Number of message-chain accounts seen so far.
    pub fn tracked_accounts(&self) -> usize {
        self.accounts.len()
    }
}

impl std::fmt::Debug for NonceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceManager")
            .field("tracked_senders", &self.locks.len())
            .field("tracked_accounts", &self.accounts.len())
            .finish()
    }
}
