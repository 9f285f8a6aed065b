//! Store collaborator traits
//!
//! The lock protocol never talks to a database directly. Any store that offers
//! per-row conditional writes with expiry and a row count query binds to
//! `LockStore`, and the protocol works against that trait only.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace and table that the locked rows belong to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    pub namespace: String,
    pub table: String,
}

impl CollectionRef {
    pub fn new(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table: table.into(),
        }
    }
}

impl Display for CollectionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.table)
    }
}

/// Identity written into the lock marker by one acquisition attempt.
///
/// Backed by a time-ordered UUID, so two attempts never share a value even
/// across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Mint a new owner identity
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for OwnerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The marker column of a collection
#[derive(Debug, Clone, Copy)]
pub struct MarkerRef<'a> {
    pub collection: &'a CollectionRef,
    pub column: &'a str,
}

/// Result of a conditional claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClaimOutcome {
    /// Whether the marker was written
    pub applied: bool,
    /// Value that prevented the write, if it did not apply
    pub current_owner: Option<OwnerId>,
}

impl ClaimOutcome {
    pub fn applied() -> Self {
        Self {
            applied: true,
            current_owner: None,
        }
    }

    pub fn held_by(owner: Option<OwnerId>) -> Self {
        Self {
            applied: false,
            current_owner: owner,
        }
    }
}

/// Store collaborator offering per-row linearizable conditional writes.
///
/// Implementations must be safe to share between unrelated locks.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Set the marker on `row` to `owner` with expiry `ttl`, if the marker is absent
    async fn try_claim(
        &self,
        marker: &MarkerRef<'_>,
        row: &str,
        owner: &OwnerId,
        ttl: Duration,
    ) -> anyhow::Result<ClaimOutcome>;

    /// Clear the marker on `row`, if it currently equals `owner`
    async fn try_release(
        &self,
        marker: &MarkerRef<'_>,
        row: &str,
        owner: &OwnerId,
    ) -> anyhow::Result<bool>;

    /// Count how many of `rows` are present in the collection
    async fn count_existing(
        &self,
        collection: &CollectionRef,
        rows: &[String],
    ) -> anyhow::Result<usize>;
}
