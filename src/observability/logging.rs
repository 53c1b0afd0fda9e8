//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Honor `RUST_LOG` over the configured level
//! - Pick pretty or JSON output

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Build the filter: `RUST_LOG` wins, else `vhost_engine=<level>`.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "vhost_engine={level},vhostctl={level},tower_http=info",
            level = config.log_level
        ))
    })
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let result = match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(level = %config.log_level, format = ?config.log_format, "Logging initialized");
    }
}
