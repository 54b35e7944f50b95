//! Log subscriber setup for the loyalty service.
//!
//! `RUST_LOG` wins when set; otherwise the configured level is applied to the
//! loyalty crates while third-party noise stays at `warn`.

use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    Directives { directives: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Directives { directives, .. } => {
                write!(f, "invalid log filter directives '{directives}'")
            }
            TelemetryError::Subscriber(err) => {
                write!(f, "failed to install log subscriber: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Directives { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Filter directives scoping the configured level to this service's crates.
fn scoped_directives(level: &str) -> String {
    format!("warn,spa_loyalty={level},spa_loyalty_api={level}")
}

fn loyalty_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = scoped_directives(&config.log_level);
    EnvFilter::try_new(&directives)
        .map_err(|source| TelemetryError::Directives { directives, source })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(loyalty_filter(config)?)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_directives_name_the_loyalty_crates() {
        let directives = scoped_directives("debug");
        assert_eq!(directives, "warn,spa_loyalty=debug,spa_loyalty_api=debug");
    }

    #[test]
    fn bad_configured_level_is_a_directives_error() {
        // Only meaningful when RUST_LOG is unset; the env override is the
        // documented escape hatch and takes precedence.
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = TelemetryConfig {
            log_level: "chatty==".to_string(),
        };
        match loyalty_filter(&config) {
            Err(TelemetryError::Directives { directives, .. }) => {
                assert!(directives.contains("chatty=="));
            }
            other => panic!("expected directives error, got {other:?}"),
        }
    }
}
