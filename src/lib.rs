//! rowlock - Multi-row mutual exclusion over compare-and-swap stores
//!
//! Locks an arbitrary set of rows in a store that offers per-row conditional
//! writes with expiry but no multi-row transactions. Each row carries a marker
//! column; a lock owns a row while the marker holds its owner id.
//!
//! Usage:
//!
//! ```no_run
//! # async fn example(store: std::sync::Arc<dyn rowlock::LockStore>) -> rowlock::LockResult<()> {
//! use std::time::Duration;
//!
//! let mut lock = rowlock::acquire(store, "keyspace", "table", Duration::from_secs(30), [
//!     "rowKey1", "rowKey2",
//! ])
//! .await?;
//! // ... rows are held for at least 30 seconds ...
//! lock.release().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

pub mod logging;

// Re-export common types
pub use rowlock_common::{
    ClaimOutcome, CollectionRef, DEFAULT_LOCK_COLUMN, DEFAULT_RETRY_INTERVAL_MS, LockError,
    LockResult, LockStore, MarkerRef, OwnerId,
};

// Re-export core types
pub use rowlock_core::store::cql;
pub use rowlock_core::{
    CqlStatements, DiagnosticSink, Lock, LockConfig, LockManager, LockPhase, LockSettings,
    LockStats, MemoryStore,
};

/// Lock `rows` of `namespace.table` for at least `timeout` with the default configuration
pub async fn acquire<I, K>(
    store: Arc<dyn LockStore>,
    namespace: &str,
    table: &str,
    timeout: Duration,
    rows: I,
) -> LockResult<Lock>
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    LockManager::with_defaults(store)
        .acquire(CollectionRef::new(namespace, table), timeout, rows)
        .await
}
