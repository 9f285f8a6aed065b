//! Row lock data model

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use rowlock_common::{CollectionRef, LockStore, MarkerRef, OwnerId};

use super::service::LockStatsCollector;
use crate::config::LockConfig;

/// Lock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockPhase {
    /// Lock constructed, no marker written yet. Transitional: a returned
    /// `Lock` is never in this phase
    #[default]
    Idle,
    /// Rows are being claimed by the current owner
    Acquiring,
    /// Attempt abandoned, a fresh owner is about to retry from the first row
    Restarting,
    /// Every requested row carries this lock's marker
    Acquired,
    /// Acquisition failed permanently. Transitional: the lock is dropped and
    /// the error returned, so only acquisition logs report this phase
    Failed,
    /// Markers were cleared by the holder
    Released,
}

/// A lock over a fixed set of rows in one collection.
///
/// Returned by `LockManager::acquire` once every row's marker holds this lock's
/// owner id. The markers expire on their own after `ttl`; call `release` to
/// clear them earlier.
pub struct Lock {
    pub(crate) owner: OwnerId,
    pub(crate) collection: CollectionRef,
    pub(crate) row_keys: Vec<String>,
    pub(crate) ttl: Duration,
    pub(crate) timeout: Duration,
    pub(crate) phase: LockPhase,
    pub(crate) restarts: u32,
    pub(crate) store: Arc<dyn LockStore>,
    pub(crate) config: Arc<LockConfig>,
    pub(crate) stats: Arc<LockStatsCollector>,
}

impl Lock {
    pub(crate) fn new(
        collection: CollectionRef,
        row_keys: Vec<String>,
        timeout: Duration,
        ttl: Duration,
        store: Arc<dyn LockStore>,
        config: Arc<LockConfig>,
        stats: Arc<LockStatsCollector>,
    ) -> Self {
        Self {
            owner: OwnerId::generate(),
            collection,
            row_keys,
            ttl,
            timeout,
            phase: LockPhase::Idle,
            restarts: 0,
            store,
            config,
            stats,
        }
    }

    /// Owner id currently written into the markers
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    /// Rows covered by this lock, in claim order
    pub fn row_keys(&self) -> &[String] {
        &self.row_keys
    }

    /// Marker lifetime, always twice the requested timeout
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Minimum hold time guaranteed after acquisition
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn phase(&self) -> LockPhase {
        self.phase
    }

    /// Number of times acquisition restarted with a fresh owner
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub(crate) fn marker(&self) -> MarkerRef<'_> {
        MarkerRef {
            collection: &self.collection,
            column: &self.config.lock_column,
        }
    }

    /// Abandon the current owner id and mint a new one
    pub(crate) fn renew_owner(&mut self) {
        self.phase = LockPhase::Restarting;
        self.owner = OwnerId::generate();
        self.restarts += 1;
    }
}

impl Debug for Lock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lock")
            .field("owner", &self.owner)
            .field("collection", &self.collection)
            .field("row_keys", &self.row_keys)
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .field("phase", &self.phase)
            .field("restarts", &self.restarts)
            .finish()
    }
}

/// Lock statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStats {
    /// Completed acquisitions
    pub acquisitions: u64,
    /// Attempts abandoned for lack of time budget
    pub restarts: u64,
    /// Claim attempts that found the row held by another owner
    pub contended_claims: u64,
    /// Successful release calls
    pub releases: u64,
    /// Acquisitions failed because a row was missing
    pub rows_not_found: u64,
    /// Operations failed by the store
    pub store_failures: u64,
}
