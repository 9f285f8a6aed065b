//! Console logging setup for applications embedding rowlock.
//!
//! Lock events are emitted under the `rowlock_core` target. `RUST_LOG`
//! overrides the configured level when set.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Console log level
    pub level: Level,
    /// Include the event target (module path)
    pub with_target: bool,
    /// Include source file and line
    pub with_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_target: true,
            with_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create from environment variables.
    ///
    /// - `ROWLOCK_LOG_LEVEL`: console level (default `info`)
    /// - `ROWLOCK_LOG_LOCATION`: `true`/`1` to print file and line
    pub fn from_env() -> Self {
        let level = std::env::var("ROWLOCK_LOG_LEVEL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Level::INFO);

        let with_location = std::env::var("ROWLOCK_LOG_LOCATION")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        Self {
            level,
            with_location,
            ..Default::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level.to_string()))
    }
}

/// Install a console subscriber as the global default.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let console_layer = fmt::layer()
        .with_target(config.with_target)
        .with_file(config.with_location)
        .with_line_number(config.with_location)
        .with_filter(config.filter());

    tracing_subscriber::registry().with(console_layer).try_init()?;
    Ok(())
}
