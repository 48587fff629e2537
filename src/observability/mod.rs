//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! keys / evm / chain / confirmation
//!     → tracing events (key=value fields, never key material)
//!     → logging.rs (optional fmt subscriber for hosts)
//!     → metrics.rs (counters on the `metrics` facade)
//! ```

pub mod logging;
pub mod metrics;
