//! Lock manager configuration
//!
//! Settings are passed explicitly to `LockManager::new`. `LockSettings` can be
//! loaded from an optional file plus `ROWLOCK_*` environment variables.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use rowlock_common::{DEFAULT_LOCK_COLUMN, DEFAULT_RETRY_INTERVAL_MS, LockError, LockResult};

/// Environment variable prefix for lock settings
pub const ENV_PREFIX: &str = "ROWLOCK";

/// Receiver for human-readable contention and restart messages
pub trait DiagnosticSink: Send + Sync {
    fn message(&self, message: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn message(&self, message: &str) {
        self(message)
    }
}

/// Serializable lock settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Name of the marker column, which must already exist on the collection
    pub lock_column: String,
    /// Wait between contended claim attempts in milliseconds
    pub retry_interval_ms: u64,
    /// Claim rows in sorted order instead of caller order
    pub sort_rows: bool,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            lock_column: DEFAULT_LOCK_COLUMN.to_string(),
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            sort_rows: false,
        }
    }
}

impl LockSettings {
    /// Load settings from an optional file, overridden by `ROWLOCK_*` variables
    pub fn load(file: Option<&Path>) -> LockResult<Self> {
        Self::load_from(file, None)
    }

    /// Load settings with an explicit environment map instead of the process environment
    pub fn load_from(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> LockResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let settings = builder
            .build()
            .and_then(|c| c.try_deserialize::<LockSettings>())
            .map_err(|e| LockError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> LockResult<()> {
        if self.lock_column.trim().is_empty() {
            return Err(LockError::Config(
                "lock_column must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration handed to the lock manager
#[derive(Clone)]
pub struct LockConfig {
    /// Name of the marker column
    pub lock_column: String,
    /// Fixed wait between contended claim attempts
    pub retry_interval: Duration,
    /// Claim rows in sorted order, removing opposite-order deadlocks
    pub sort_rows: bool,
    /// Optional diagnostic sink, no-op when absent
    pub sink: Option<Arc<dyn DiagnosticSink>>,
}

impl Default for LockConfig {
    fn default() -> Self {
        LockSettings::default().into()
    }
}

impl Debug for LockConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockConfig")
            .field("lock_column", &self.lock_column)
            .field("retry_interval", &self.retry_interval)
            .field("sort_rows", &self.sort_rows)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl From<LockSettings> for LockConfig {
    fn from(settings: LockSettings) -> Self {
        Self {
            lock_column: settings.lock_column,
            retry_interval: Duration::from_millis(settings.retry_interval_ms),
            sort_rows: settings.sort_rows,
            sink: None,
        }
    }
}

impl LockConfig {
    pub fn with_lock_column(mut self, column: impl Into<String>) -> Self {
        self.lock_column = column.into();
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_sorted_rows(mut self, sort_rows: bool) -> Self {
        self.sort_rows = sort_rows;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Forward a message to the diagnostic sink, if one is configured
    pub(crate) fn notify(&self, message: &str) {
        if let Some(sink) = &self.sink {
            sink.message(message);
        }
    }
}
