//! Standardized logging setup for the Hawaii session
//!
//! All output follows the `YYYY-MM-DD HH:MM:SS LEVEL target: message`
//! format. `RUST_LOG` overrides the default filter.

use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,hawaii=debug";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    let installed = tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_ansi(false)
        .with_env_filter(env_filter())
        .try_init();

    if installed.is_err() {
        tracing::debug!("Logging already initialized");
    }
}
