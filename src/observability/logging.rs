//! Structured logging.
//!
//! # Responsibilities
//! - Install a `tracing` subscriber for binaries and tests that embed the crate
//! - Let `RUST_LOG` override the configured level
//!
//! Libraries should not force a subscriber on their host, so nothing in this
//! crate calls `init` on its own.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber filtered at `default_level` (e.g. `"info"`,
/// `"twinchain=debug"`). Returns `false` when a global subscriber already
/// exists, which makes repeated calls harmless.
pub fn init(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok()
}
