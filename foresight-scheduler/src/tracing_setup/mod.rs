//! Tracing setup: structured logging and event helpers.

pub mod events;

use foresight_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Install the subscriber with default observability settings.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    init_tracing_from_config(&ObservabilityConfig::default())
}

/// Initialize tracing from configuration. `FORESIGHT_LOG` still wins.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing_from_config(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_env("FORESIGHT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.json_logs {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
