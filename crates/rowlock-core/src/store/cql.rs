//! CQL statements for Cassandra-style stores
//!
//! A driver binding implements `LockStore` by running these statements as
//! lightweight transactions:
//! - claim: bind `(ttl_seconds, owner, row)`, read `[applied]` and the previous marker
//! - release: bind `(row, owner)`, read `[applied]`
//! - count: bind the list of row keys, read a single count

use std::time::Duration;

use rowlock_common::CollectionRef;

/// Default partition key column of the locked table
pub const DEFAULT_KEY_COLUMN: &str = "id";

/// Largest TTL Cassandra accepts (20 years)
pub const MAX_TTL_SECONDS: u32 = 630_720_000;

/// Quote a CQL identifier, doubling embedded quotes
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Convert a marker TTL into whole CQL seconds.
///
/// Rounds up, and never returns 0 because a CQL TTL of 0 means "no expiry".
pub fn ttl_seconds(ttl: Duration) -> u32 {
    let secs = ttl
        .as_secs()
        .saturating_add(u64::from(ttl.subsec_nanos() > 0));
    secs.clamp(1, u64::from(MAX_TTL_SECONDS)) as u32
}

/// Rendered statements for one collection and marker column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlStatements {
    pub claim: String,
    pub release: String,
    pub count: String,
}

impl CqlStatements {
    pub fn new(collection: &CollectionRef, lock_column: &str) -> Self {
        Self::with_key_column(collection, lock_column, DEFAULT_KEY_COLUMN)
    }

    pub fn with_key_column(collection: &CollectionRef, lock_column: &str, key_column: &str) -> Self {
        let table = format!(
            "{}.{}",
            quote_identifier(&collection.namespace),
            quote_identifier(&collection.table)
        );
        let lock = quote_identifier(lock_column);
        let key = quote_identifier(key_column);

        Self {
            claim: format!(
                "UPDATE {table} USING TTL ? SET {lock} = ? WHERE {key} = ? IF {lock} = null"
            ),
            release: format!("UPDATE {table} SET {lock} = null WHERE {key} = ? IF {lock} = ?"),
            count: format!("SELECT COUNT(*) FROM {table} WHERE {key} in ?"),
        }
    }
}
