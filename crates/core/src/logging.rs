//! Logging initialization.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `LayerscanConfig`. Supports JSON structured logging and
//! human-readable pretty format.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::GeneralConfig;
use crate::error::LayerscanError;

/// Initialize the global tracing subscriber.
///
/// Must be called at most once per process, before any tracing macros are used.
/// `RUST_LOG` takes precedence over `log_level` when set.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (default for production)
/// * `"pretty"` - Human-readable colored output (for development)
pub fn init_tracing(config: &GeneralConfig) -> Result<(), LayerscanError> {
    config.validate()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = match config.log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };

    result
        .map_err(|e| LayerscanError::Logging(format!("tracing subscriber already set: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_format_before_installing() {
        let config = GeneralConfig {
            log_level: "info".to_owned(),
            log_format: "xml".to_owned(),
        };
        let err = init_tracing(&config).unwrap_err();
        assert!(err.to_string().contains("general.log_format"));
    }

    #[test]
    fn second_init_fails() {
        let config = GeneralConfig {
            log_level: "debug".to_owned(),
            log_format: "pretty".to_owned(),
        };
        // 다른 테스트가 먼저 설치했을 수 있으므로 첫 호출 결과는 무시
        let _ = init_tracing(&config);
        let err = init_tracing(&config).unwrap_err();
        assert!(matches!(err, LayerscanError::Logging(_)));
        assert!(!err.to_string().contains("log_format"));
    }
}
