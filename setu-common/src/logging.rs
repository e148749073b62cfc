//! Tracing initialization shared by Setu binaries

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for a service
///
/// `RUST_LOG` wins when set; otherwise the configured level is applied to the
/// service crate and to `tower_http`.
pub fn build_filter(crate_name: &str, logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = logging.level.trim();
        if level.contains('=') {
            // Already a full directive list
            EnvFilter::new(level)
        } else {
            EnvFilter::new(format!("{crate_name}={level},tower_http={level},{level}"))
        }
    })
}

/// Install the global tracing subscriber (fmt layer + env filter)
pub fn init_tracing(crate_name: &str, logging: &LoggingConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(build_filter(crate_name, logging))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {}", e)))
}

/// Run `f` under a scoped default-level subscriber
///
/// Config loading runs before the configured subscriber exists; this keeps
/// its resolution and fallback logs visible.
pub fn with_bootstrap_logging<T>(crate_name: &str, f: impl FnOnce() -> T) -> T {
    let subscriber = tracing_subscriber::registry()
        .with(build_filter(crate_name, &LoggingConfig::default()))
        .with(tracing_subscriber::fmt::layer());
    tracing::subscriber::with_default(subscriber, f)
}
