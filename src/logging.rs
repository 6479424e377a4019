//! Logger setup.
//!
//! Verbosity comes only from [`LoggingConfig`], handed over once at startup.
//! The process environment (`RUST_LOG` and friends) is not consulted, and
//! the HTTP/TLS stack gets its own, usually quieter, level.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Crates whose output is governed by `http_level`.
const HTTP_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "h2", "rustls", "gcp_auth"];

/// Filter directives for `config`, e.g. `warn,reqwest=error,hyper=error,...`.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let level = config.level.to_ascii_lowercase();
    let http_level = config.http_level.to_ascii_lowercase();

    let mut directives = vec![level];
    directives.extend(
        HTTP_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, http_level)),
    );
    directives.join(",")
}

/// Install the global subscriber, writing to stderr.
///
/// Fails if the directives do not parse or a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(filter_directives(config))
        .map_err(|e| anyhow!("invalid logging configuration: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_split_http_stack() {
        let config = LoggingConfig {
            level: "INFO".to_string(),
            http_level: "error".to_string(),
        };
        let directives = filter_directives(&config);
        assert!(directives.starts_with("info,"));
        assert!(directives.contains("reqwest=error"));
        assert!(directives.contains("hyper=error"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_default_directives_parse() {
        let directives = filter_directives(&LoggingConfig::default());
        assert!(directives.starts_with("warn,"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
