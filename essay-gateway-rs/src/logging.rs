//! # Structured Logging
//!
//! Installs the global tracing subscriber for the gateway. The filter comes
//! from `RUST_LOG` (default `info`); `ESSAY_LOG_FORMAT=json` switches the
//! output to flattened JSON events.

use std::env;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Fallback level when `RUST_LOG` is unset
    pub level: String,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Read the output format from `ESSAY_LOG_FORMAT`
    pub fn from_env() -> Self {
        let json_format = env::var("ESSAY_LOG_FORMAT")
            .map(|v| v.trim().eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Self {
            json_format,
            ..Self::default()
        }
    }
}

/// Install the global subscriber
///
/// Also bridges `log` records into tracing. Fails if a subscriber is
/// already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = Registry::default().with(filter);

    // JSON and text layers have distinct types, so each branch installs its own
    if config.json_format {
        let json_layer = fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_target(true);

        subscriber.with(json_layer).try_init()
    } else {
        let text_layer = fmt::layer().with_target(true);

        subscriber.with(text_layer).try_init()
    }
    .map_err(|e| format!("Failed to set global subscriber: {}", e))?;

    tracing::info!(json = config.json_format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_env() {
        env::set_var("ESSAY_LOG_FORMAT", "JSON");
        assert!(LoggingConfig::from_env().json_format);

        env::set_var("ESSAY_LOG_FORMAT", "text");
        assert!(!LoggingConfig::from_env().json_format);

        env::remove_var("ESSAY_LOG_FORMAT");
        assert_eq!(LoggingConfig::from_env().level, "info");
    }
}
