//! Error types for rowlock
//!
//! This module defines:
//! - `LockError`: Errors surfaced to callers of the lock protocol
//! - `LockResult`: Convenience result alias

use crate::traits::CollectionRef;

/// Errors returned by lock acquisition and release
#[derive(thiserror::Error, Debug)]
pub enum LockError {
    /// Failure reported by the store collaborator, passed through unchanged
    #[error(transparent)]
    Store(#[from] anyhow::Error),

    /// At least one requested row is absent from the collection
    #[error("row not found in {collection}: {found} of {requested} requested rows exist")]
    RowNotFound {
        collection: CollectionRef,
        requested: usize,
        found: usize,
    },

    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl LockError {
    /// Whether this error came from the store collaborator
    pub fn is_store_failure(&self) -> bool {
        matches!(self, LockError::Store(_))
    }

    /// Whether this error reports missing rows
    pub fn is_row_not_found(&self) -> bool {
        matches!(self, LockError::RowNotFound { .. })
    }
}

pub type LockResult<T> = Result<T, LockError>;
