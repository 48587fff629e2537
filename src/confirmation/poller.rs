//! The wait-for-finality loop shared by both chains.
//!
//! ```text
//! Pending ──poll──▶ Pending ──poll──▶ … ──▶ Confirmed | Failed
//!    │
//!    └── deadline reached while Pending ──▶ TimedOut
//!    └── cancel token fired ──────────────▶ Cancelled
//! ```
//!
//! Each tick polls first and only then checks the deadline, so a result that
//! appears on the tick at exactly the deadline is still reported. A lookup
//! still in flight at the deadline is abandoned, and cancellation also
//! interrupts an in-flight lookup.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{timeout_at, Instant, MissedTickBehavior};

use crate::config::PollConfig;
use crate::confirmation::cancel::CancelToken;
use crate::error::Result;

/// What one status lookup saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<R> {
    /// Not yet included.
    Pending,
    Success(R),
    /// Included, executed with a failure.
    Failure(R),
}

/// Where the poller looks for a transaction's outcome.
#[async_trait]
pub trait StatusSource: Send + Sync {
    type Output: Send;

    /// One lookup. Transport errors end the wait.
    async fn poll_status(&self) -> Result<PollStatus<Self::Output>>;
}

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation<R> {
    Confirmed(R),
    /// Included with a failure; carries the receipt so gas used can be read.
    Failed(R),
    /// Still pending at the deadline. The transaction may yet be included.
    TimedOut,
    Cancelled,
}

impl<R> Confirmation<R> {
    /// Label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Confirmed(_) => "confirmed",
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Shortest interval a poller will tick at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    interval: Duration,
    timeout: Duration,
}

impl Poller {
    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval: interval.max(MIN_POLL_INTERVAL),
            timeout,
        }
    }

    pub fn from_config(config: &PollConfig) -> Self {
        Self::new(
            Duration::from_millis(config.interval_ms),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll `source` until it resolves, the timeout passes, or `cancel` fires.
    pub async fn wait<S: StatusSource>(
        &self,
        source: &S,
        cancel: Option<&CancelToken>,
    ) -> Result<Confirmation<S::Output>> {
        let deadline = Instant::now() + self.timeout;
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Ok(Confirmation::Cancelled),
                        _ = ticker.tick() => {}
                    }
                }
                None => {
                    ticker.tick().await;
                }
            }

            let lookup = timeout_at(deadline, source.poll_status());
            let status = match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Ok(Confirmation::Cancelled),
                        status = lookup => status,
                    }
                }
                None => lookup.await,
            };

            match status {
                Err(_elapsed) => return Ok(Confirmation::TimedOut),
                Ok(status) => match status? {
                    PollStatus::Success(receipt) => return Ok(Confirmation::Confirmed(receipt)),
                    PollStatus::Failure(receipt) => return Ok(Confirmation::Failed(receipt)),
                    PollStatus::Pending => {}
                },
            }

            if Instant::now() >= deadline {
                return Ok(Confirmation::TimedOut);
            }
        }
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::from_config(&PollConfig::default())
    }
}
