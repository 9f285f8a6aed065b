//! Store bindings
//!
//! - `MemoryStore`: in-process `LockStore` with per-row CAS and TTL
//! - `cql`: statements a Cassandra driver binding executes

pub mod cql;
mod memory;

pub use cql::CqlStatements;
pub use memory::MemoryStore;
