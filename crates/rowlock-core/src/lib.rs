//! rowlock core - Multi-row locking over a CAS store
//!
//! This crate provides:
//! - The acquire/release protocol (`LockManager`, `Lock`)
//! - Lock configuration and settings loading
//! - An in-memory store and CQL statements for Cassandra-style stores

pub mod config;
pub mod lock;
pub mod store;

// Re-export config types
pub use config::{DiagnosticSink, LockConfig, LockSettings};

// Re-export lock types
pub use lock::{Lock, LockManager, LockPhase, LockStats};

// Re-export stores
pub use store::{CqlStatements, MemoryStore};
