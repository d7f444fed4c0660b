use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Install the global fmt subscriber.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config, std::env::var("RUST_LOG").ok())?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(config.ansi)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// `RUST_LOG` wins when it parses; otherwise the configured level applies.
pub(crate) fn build_filter(
    config: &TelemetryConfig,
    env_override: Option<String>,
) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = env_override.and_then(|raw| EnvFilter::try_new(raw).ok()) {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
        value: config.log_level.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
            ansi: false,
        }
    }

    #[test]
    fn configured_level_used_without_override() {
        let filter = build_filter(&config("debug"), None).expect("valid filter");
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn env_override_takes_precedence() {
        let filter = build_filter(&config("info"), Some("dscr_docs=trace".to_string()))
            .expect("valid override");
        assert_eq!(filter.to_string(), "dscr_docs=trace");
    }

    #[test]
    fn invalid_configured_level_is_reported() {
        let err = build_filter(&config("dscr_docs=verbose"), None).expect_err("bad filter");
        assert!(matches!(err, TelemetryError::EnvFilter { .. }));
        assert!(err.to_string().contains("dscr_docs=verbose"));
    }
}
