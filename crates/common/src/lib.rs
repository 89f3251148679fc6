//! Shared utilities used across the trading workspace.
//!
//! - **Environment**: `BinanceEnvironment` selects production (per top-level
//!   domain) or testnet endpoints
//! - **Backoff**: `ExponentialBackoff` for bounded polling and retry loops
//! - **Logging**: `init_logging` installs the `tracing` subscriber

mod backoff;
mod environment;

pub use backoff::ExponentialBackoff;
pub use environment::{BinanceEnvironment, ParseEnvironmentError};

use tracing_subscriber::EnvFilter;

/// Default filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG` and falls back to `info`. Calling this more than once is
/// harmless; later calls are ignored.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
