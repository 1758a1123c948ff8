//! Structured logging setup.

use crate::config::{Config, LogFormat};
use crate::error::TokenError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            json_output: config.log_format == LogFormat::Json,
            ..Self::default()
        }
    }
}

/// Install the global subscriber. Call once at startup.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TokenError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TokenError::config(format!("Invalid LOG_LEVEL {:?}: {}", config.log_level, e)))?;
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if config.json_output {
        subscriber
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init()
    } else {
        subscriber.with(fmt::layer().with_target(false)).try_init()
    };
    installed.map_err(|e| TokenError::config(format!("Tracing already initialized: {}", e)))?;

    tracing::info!(service = %config.service_name, json = config.json_output, "Tracing initialized");
    Ok(())
}
