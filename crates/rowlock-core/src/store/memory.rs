// In-memory lock store
// Rows and markers live in a DashMap; markers expire lazily on access

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use rowlock_common::{ClaimOutcome, CollectionRef, LockStore, MarkerRef, OwnerId};

/// A marker value with its optional expiry
#[derive(Debug, Clone, Copy)]
struct MarkerEntry {
    owner: OwnerId,
    expires_at: Option<Instant>,
}

impl MarkerEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

#[derive(Debug, Default)]
struct RowEntry {
    /// Marker column name -> marker
    markers: HashMap<String, MarkerEntry>,
}

impl RowEntry {
    fn live_marker(&mut self, column: &str) -> Option<OwnerId> {
        match self.markers.get(column) {
            Some(entry) if entry.is_expired() => {
                self.markers.remove(column);
                None
            }
            Some(entry) => Some(entry.owner),
            None => None,
        }
    }
}

/// In-memory `LockStore`.
///
/// Each row's conditional writes run under its DashMap shard lock, so they are
/// linearizable per row. A claim on a row that does not exist never applies.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: DashMap<(CollectionRef, String), RowEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(collection: &CollectionRef, row: &str) -> (CollectionRef, String) {
        (collection.clone(), row.to_string())
    }

    /// Create a row with no markers; existing rows are left untouched
    pub fn insert_row(&self, collection: &CollectionRef, row: impl Into<String>) {
        self.rows
            .entry((collection.clone(), row.into()))
            .or_default();
    }

    /// Delete a row and its markers
    pub fn remove_row(&self, collection: &CollectionRef, row: &str) -> bool {
        self.rows.remove(&Self::key(collection, row)).is_some()
    }

    pub fn contains_row(&self, collection: &CollectionRef, row: &str) -> bool {
        self.rows.contains_key(&Self::key(collection, row))
    }

    /// Current unexpired marker value of a row
    pub fn marker(&self, collection: &CollectionRef, column: &str, row: &str) -> Option<OwnerId> {
        self.rows
            .get_mut(&Self::key(collection, row))
            .and_then(|mut entry| entry.live_marker(column))
    }

    /// Overwrite a row's marker without any condition or expiry
    pub fn set_marker(
        &self,
        collection: &CollectionRef,
        column: &str,
        row: &str,
        owner: Option<OwnerId>,
    ) {
        if let Some(mut entry) = self.rows.get_mut(&Self::key(collection, row)) {
            match owner {
                Some(owner) => {
                    entry.markers.insert(
                        column.to_string(),
                        MarkerEntry {
                            owner,
                            expires_at: None,
                        },
                    );
                }
                None => {
                    entry.markers.remove(column);
                }
            }
        }
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn try_claim(
        &self,
        marker: &MarkerRef<'_>,
        row: &str,
        owner: &OwnerId,
        ttl: Duration,
    ) -> anyhow::Result<ClaimOutcome> {
        let Some(mut entry) = self.rows.get_mut(&Self::key(marker.collection, row)) else {
            return Ok(ClaimOutcome::held_by(None));
        };
        if let Some(current) = entry.live_marker(marker.column) {
            return Ok(ClaimOutcome::held_by(Some(current)));
        }

        entry.markers.insert(
            marker.column.to_string(),
            MarkerEntry {
                owner: *owner,
                // Past the clock's range means the marker never expires
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        debug!(collection = %marker.collection, row = %row, owner = %owner, "Marker set");
        Ok(ClaimOutcome::applied())
    }

    async fn try_release(
        &self,
        marker: &MarkerRef<'_>,
        row: &str,
        owner: &OwnerId,
    ) -> anyhow::Result<bool> {
        let Some(mut entry) = self.rows.get_mut(&Self::key(marker.collection, row)) else {
            return Ok(false);
        };
        if entry.live_marker(marker.column) != Some(*owner) {
            return Ok(false);
        }
        entry.markers.remove(marker.column);
        Ok(true)
    }

    async fn count_existing(
        &self,
        collection: &CollectionRef,
        rows: &[String],
    ) -> anyhow::Result<usize> {
        Ok(rows
            .iter()
            .filter(|row| self.contains_row(collection, row))
            .count())
    }
}
