//! Tracing initialisation for hosts that do not install their own subscriber

use crate::error::{EngineError, Result};
use crate::settings::LoggingConfig;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Install a global subscriber. `RUST_LOG` wins over the configured level.
///
/// Fails with [`EngineError::Telemetry`] when a subscriber is already set.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| EngineError::Telemetry(format!("Invalid log filter: {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.map_err(|e| EngineError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let logging = LoggingConfig::default();
        // Another test binary may have installed one already; the second call must fail either way.
        let _ = init_tracing(&logging);
        assert!(matches!(
            init_tracing(&logging),
            Err(EngineError::Telemetry(_))
        ));
    }

    #[test]
    fn test_invalid_filter() {
        let logging = LoggingConfig {
            level: "activation=loud".to_string(),
            json: false,
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(
                init_tracing(&logging),
                Err(EngineError::Telemetry(_))
            ));
        }
    }
}
