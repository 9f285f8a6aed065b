//! rowlock common - Shared types, traits, and errors
//!
//! This crate provides the foundational types used by the lock protocol:
//! - Error types
//! - The store collaborator trait
//! - Common constants

pub mod error;
pub mod traits;

// Re-exports for convenience
pub use error::{LockError, LockResult};
pub use traits::*;

/// Default name of the lock marker column
pub const DEFAULT_LOCK_COLUMN: &str = "[lock]";

/// Default wait between contended claim attempts, in milliseconds
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 500;
