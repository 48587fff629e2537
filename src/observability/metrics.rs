//! Metrics collection.
//!
//! # Metrics
//! - `twinchain_tx_submitted_total` (counter): submissions by chain and outcome
//! - `twinchain_confirmations_total` (counter): poller outcomes by chain
//! - `twinchain_permits_signed_total` (counter): permits signed by kind
//! - `twinchain_rpc_failover_total` (counter): EVM reads that fell through to a failover endpoint
//!
//! Updates go through the `metrics` facade. Without an installed recorder
//! (the default for a library) they are no-ops.

/// Which ledger an operation targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Evm,
    Message,
}

impl ChainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainKind::Evm => "evm",
            ChainKind::Message => "message",
        }
    }
}

pub fn record_tx_submitted(chain: ChainKind, accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    metrics::counter!(
        "twinchain_tx_submitted_total",
        "chain" => chain.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// `outcome` is one of `confirmed`, `failed`, `timed_out`, `cancelled`.
pub fn record_confirmation(chain: ChainKind, outcome: &'static str) {
    metrics::counter!(
        "twinchain_confirmations_total",
        "chain" => chain.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_permit_signed(kind: &'static str) {
    metrics::counter!("twinchain_permits_signed_total", "kind" => kind).increment(1);
}

pub fn record_rpc_failover(method: &'static str) {
    metrics::counter!("twinchain_rpc_failover_total", "method" => method).increment(1);
}
