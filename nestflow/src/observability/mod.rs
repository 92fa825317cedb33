//! Observability utilities: logging setup and span timing.

mod spans;

pub use spans::{SpanTimer, TaskSpanAttributes};

use crate::config::LoggingConfig;
use crate::errors::ConfigurationError;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Installs a global tracing subscriber.
///
/// `RUST_LOG` wins over `config.default_level`. Output goes to stderr, as
/// JSON lines when `config.json` is set.
///
/// # Errors
///
/// Returns a `ConfigurationError` if the filter directive is invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigurationError> {
    let env_filter = build_filter(config)?;

    let json_layer = config
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let plain_layer = (!config.json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(json_layer)
        .with(plain_layer)
        .with(env_filter)
        .try_init()
        .map_err(|err| ConfigurationError::new(format!("Failed to install subscriber: {err}")))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigurationError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .map_err(|err| {
            ConfigurationError::new(format!(
                "Invalid log level '{}': {err}",
                config.default_level
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_from_config() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            default_level: "nestflow=debug".to_string(),
            json: false,
        };
        assert!(build_filter(&config).is_ok());

        let invalid = LoggingConfig {
            default_level: "nestflow=[".to_string(),
            json: false,
        };
        assert!(build_filter(&invalid).is_err());
    }
}
