//! Row lock acquisition and release
//!
//! Provides:
//! - Acquire with restart on insufficient time budget
//! - Row-by-row claiming through conditional writes
//! - Missing-row detection on contention
//! - Best-effort conditional release

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use rowlock_common::{CollectionRef, LockError, LockResult, LockStore, MarkerRef, OwnerId};

use super::model::*;
use crate::config::LockConfig;

/// Why an acquisition attempt stopped short
enum AttemptError {
    /// Not enough of the TTL window left to honor the timeout; start over
    InsufficientTimeBudget,
    Fatal(LockError),
}

#[derive(Default)]
pub(crate) struct LockStatsCollector {
    acquisitions: AtomicU64,
    restarts: AtomicU64,
    contended_claims: AtomicU64,
    releases: AtomicU64,
    rows_not_found: AtomicU64,
    store_failures: AtomicU64,
}

impl LockStatsCollector {
    fn record_acquisition(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rowlock_acquisitions_total").increment(1);
    }

    fn record_restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rowlock_restarts_total").increment(1);
    }

    fn record_contention(&self) {
        self.contended_claims.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rowlock_contended_claims_total").increment(1);
    }

    fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rowlock_releases_total").increment(1);
    }

    fn record_failure(&self, err: &LockError) {
        match err {
            LockError::RowNotFound { .. } => {
                self.rows_not_found.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("rowlock_rows_not_found_total").increment(1);
            }
            LockError::Store(_) => {
                self.store_failures.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("rowlock_store_failures_total").increment(1);
            }
            _ => {}
        }
    }

    fn snapshot(&self) -> LockStats {
        LockStats {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
            contended_claims: self.contended_claims.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            rows_not_found: self.rows_not_found.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// Acquires row locks against a shared store
pub struct LockManager {
    store: Arc<dyn LockStore>,
    config: Arc<LockConfig>,
    stats: Arc<LockStatsCollector>,
}

impl LockManager {
    pub fn new(store: Arc<dyn LockStore>, config: LockConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            stats: Arc::new(LockStatsCollector::default()),
        }
    }

    /// Create a manager with the default configuration
    pub fn with_defaults(store: Arc<dyn LockStore>) -> Self {
        Self::new(store, LockConfig::default())
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn stats(&self) -> LockStats {
        self.stats.snapshot()
    }

    /// Lock `rows` of `collection` for at least `timeout`.
    ///
    /// Waits until every row's marker holds a fresh owner id. Restarts from the
    /// first row with a new owner whenever the remaining TTL window gets too
    /// short to guarantee `timeout`. Under sustained contention this may wait
    /// indefinitely.
    ///
    /// # Errors
    ///
    /// - `LockError::RowNotFound` if a requested row does not exist
    /// - `LockError::Store` if the store fails; never retried
    /// - `LockError::IllegalArgument` for an empty row list, duplicate rows, a
    ///   zero timeout or a timeout whose TTL cannot be represented as a deadline
    pub async fn acquire<I, K>(
        &self,
        collection: CollectionRef,
        timeout: Duration,
        rows: I,
    ) -> LockResult<Lock>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut row_keys: Vec<String> = rows.into_iter().map(Into::into).collect();
        if row_keys.is_empty() {
            return Err(LockError::IllegalArgument(
                "at least one row key is required".to_string(),
            ));
        }
        if timeout.is_zero() {
            return Err(LockError::IllegalArgument(
                "timeout must be greater than zero".to_string(),
            ));
        }
        {
            let mut seen = HashSet::with_capacity(row_keys.len());
            if let Some(dup) = row_keys.iter().find(|k| !seen.insert(k.as_str())) {
                return Err(LockError::IllegalArgument(format!(
                    "row key '{}' requested more than once",
                    dup
                )));
            }
        }
        let ttl = timeout
            .checked_mul(2)
            .filter(|ttl| Instant::now().checked_add(*ttl).is_some())
            .ok_or_else(|| {
                LockError::IllegalArgument(format!("timeout {:?} is too large", timeout))
            })?;
        if self.config.sort_rows {
            row_keys.sort();
        }

        let mut lock = Lock::new(
            collection,
            row_keys,
            timeout,
            ttl,
            self.store.clone(),
            self.config.clone(),
            self.stats.clone(),
        );

        loop {
            lock.phase = LockPhase::Acquiring;
            match self.acquire_attempt(&lock).await {
                Ok(()) => {
                    lock.phase = LockPhase::Acquired;
                    self.stats.record_acquisition();
                    info!(
                        collection = %lock.collection,
                        owner = %lock.owner,
                        rows = lock.row_keys.len(),
                        restarts = lock.restarts,
                        "Row lock acquired"
                    );
                    return Ok(lock);
                }
                Err(AttemptError::InsufficientTimeBudget) => {
                    lock.renew_owner();
                    self.stats.record_restart();
                }
                Err(AttemptError::Fatal(err)) => {
                    lock.phase = LockPhase::Failed;
                    debug!(
                        collection = %lock.collection,
                        owner = %lock.owner,
                        phase = ?lock.phase,
                        error = %err,
                        "Row lock acquisition failed"
                    );
                    self.stats.record_failure(&err);
                    return Err(err);
                }
            }
        }
    }

    /// One pass over every row with the lock's current owner id
    async fn acquire_attempt(&self, lock: &Lock) -> Result<(), AttemptError> {
        let marker = lock.marker();
        let mut deadline = Instant::now();

        for (i, row) in lock.row_keys.iter().enumerate() {
            loop {
                if i == 0 {
                    deadline = Instant::now().checked_add(lock.ttl).ok_or_else(|| {
                        AttemptError::Fatal(LockError::IllegalArgument(format!(
                            "ttl {:?} overflows the clock",
                            lock.ttl
                        )))
                    })?;
                } else if deadline.saturating_duration_since(Instant::now()) < lock.timeout {
                    warn!(
                        collection = %lock.collection,
                        owner = %lock.owner,
                        row = %row,
                        "Cannot satisfy timeout, restarting acquire"
                    );
                    self.config
                        .notify("cannot satisfy timeout, restarting acquire");
                    self.abort(lock, &marker, &lock.row_keys[..i]).await;
                    return Err(AttemptError::InsufficientTimeBudget);
                }

                let outcome = match self
                    .store
                    .try_claim(&marker, row, &lock.owner, lock.ttl)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        // The write may have applied before the failure surfaced
                        self.abort(lock, &marker, &lock.row_keys[..=i]).await;
                        return Err(AttemptError::Fatal(LockError::Store(e)));
                    }
                };
                if outcome.applied {
                    debug!(row = %row, owner = %lock.owner, "Row claimed");
                    break;
                }

                self.stats.record_contention();
                let prev = outcome
                    .current_owner
                    .map(|o| o.to_string())
                    .unwrap_or_default();
                debug!(row = %row, owner = %lock.owner, held_by = %prev, "Row is locked");
                self.config.notify(&format!(
                    "cannot lock row: lock key={} lockID={} prevLockID={}",
                    row, lock.owner, prev
                ));

                if let Err(err) = self.check_rows(lock).await {
                    self.abort(lock, &marker, &lock.row_keys[..i]).await;
                    return Err(AttemptError::Fatal(err));
                }

                sleep(self.config.retry_interval).await;
            }
        }
        Ok(())
    }

    /// Fail unless every requested row exists in the collection
    async fn check_rows(&self, lock: &Lock) -> LockResult<()> {
        let found = self
            .store
            .count_existing(&lock.collection, &lock.row_keys)
            .await?;
        if found != lock.row_keys.len() {
            warn!(
                collection = %lock.collection,
                requested = lock.row_keys.len(),
                found,
                "Requested rows not found"
            );
            return Err(LockError::RowNotFound {
                collection: lock.collection.clone(),
                requested: lock.row_keys.len(),
                found,
            });
        }
        Ok(())
    }

    /// Release rows claimed by an abandoned attempt, keeping the original cause
    async fn abort(&self, lock: &Lock, marker: &MarkerRef<'_>, claimed: &[String]) {
        if let Err(e) = release_rows(self.store.as_ref(), marker, claimed, &lock.owner).await {
            warn!(
                collection = %lock.collection,
                owner = %lock.owner,
                error = %e,
                "Failed to release rows of abandoned attempt"
            );
        }
    }
}

impl Lock {
    /// Clear this lock's marker on every row, in order.
    ///
    /// A row whose marker no longer holds this owner is skipped silently. A
    /// store failure stops the loop and is returned; the remaining rows keep
    /// their markers until the TTL expires.
    pub async fn release(&mut self) -> LockResult<()> {
        let marker = self.marker();
        let result = release_rows(self.store.as_ref(), &marker, &self.row_keys, &self.owner).await;
        match result {
            Ok(released) => {
                debug!(
                    collection = %self.collection,
                    owner = %self.owner,
                    released,
                    rows = self.row_keys.len(),
                    "Row lock released"
                );
                self.phase = LockPhase::Released;
                self.stats.record_release();
                Ok(())
            }
            Err(e) => {
                let err = LockError::Store(e);
                self.stats.record_failure(&err);
                Err(err)
            }
        }
    }
}

/// Conditionally clear the marker on `rows`, returning how many clears applied
async fn release_rows(
    store: &dyn LockStore,
    marker: &MarkerRef<'_>,
    rows: &[String],
    owner: &OwnerId,
) -> anyhow::Result<usize> {
    let mut released = 0;
    for row in rows {
        if store.try_release(marker, row, owner).await? {
            released += 1;
        } else {
            debug!(row = %row, owner = %owner, "Row no longer held by this owner");
        }
    }
    Ok(released)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use proptest::prelude::*;
    use rowlock_common::ClaimOutcome;

    use super::*;
    use crate::store::MemoryStore;

    fn collection() -> CollectionRef {
        CollectionRef::new("ks", "t")
    }

    fn memory_store(rows: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for row in rows {
            store.insert_row(&collection(), *row);
        }
        store
    }

    fn manager(store: Arc<dyn LockStore>) -> LockManager {
        LockManager::new(
            store,
            LockConfig::default().with_retry_interval(Duration::from_millis(10)),
        )
    }

    /// Store whose marker on one row is held for a fixed number of claim attempts
    struct FlippingStore {
        inner: MemoryStore,
        held_for: AtomicUsize,
        count_calls: AtomicUsize,
    }

    #[async_trait]
    impl LockStore for FlippingStore {
        async fn try_claim(
            &self,
            marker: &MarkerRef<'_>,
            row: &str,
            owner: &OwnerId,
            ttl: Duration,
        ) -> anyhow::Result<ClaimOutcome> {
            let remaining = self.held_for.load(Ordering::SeqCst);
            if remaining > 0 {
                self.held_for.store(remaining - 1, Ordering::SeqCst);
                return Ok(ClaimOutcome::held_by(Some(OwnerId::generate())));
            }
            self.inner.try_claim(marker, row, owner, ttl).await
        }

        async fn try_release(
            &self,
            marker: &MarkerRef<'_>,
            row: &str,
            owner: &OwnerId,
        ) -> anyhow::Result<bool> {
            self.inner.try_release(marker, row, owner).await
        }

        async fn count_existing(
            &self,
            collection: &CollectionRef,
            rows: &[String],
        ) -> anyhow::Result<usize> {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.count_existing(collection, rows).await
        }
    }

    /// Store that fails a claim on one row after applying it, or every count query
    struct FaultyStore {
        inner: MemoryStore,
        fail_claim_on: Option<String>,
        fail_count: bool,
        claim_calls: AtomicUsize,
        count_calls: AtomicUsize,
    }

    impl FaultyStore {
        fn new(fail_claim_on: Option<&str>, fail_count: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_claim_on: fail_claim_on.map(str::to_string),
                fail_count,
                claim_calls: AtomicUsize::new(0),
                count_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LockStore for FaultyStore {
        async fn try_claim(
            &self,
            marker: &MarkerRef<'_>,
            row: &str,
            owner: &OwnerId,
            ttl: Duration,
        ) -> anyhow::Result<ClaimOutcome> {
            self.claim_calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.inner.try_claim(marker, row, owner, ttl).await?;
            if self.fail_claim_on.as_deref() == Some(row) {
                anyhow::bail!("write timeout on row {}", row);
            }
            Ok(outcome)
        }

        async fn try_release(
            &self,
            marker: &MarkerRef<'_>,
            row: &str,
            owner: &OwnerId,
        ) -> anyhow::Result<bool> {
            self.inner.try_release(marker, row, owner).await
        }

        async fn count_existing(
            &self,
            collection: &CollectionRef,
            rows: &[String],
        ) -> anyhow::Result<usize> {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_count {
                anyhow::bail!("read timeout");
            }
            self.inner.count_existing(collection, rows).await
        }
    }

    /// Store that fails every release of one row
    struct FailingReleaseStore {
        inner: MemoryStore,
        failing_row: String,
        release_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LockStore for FailingReleaseStore {
        async fn try_claim(
            &self,
            marker: &MarkerRef<'_>,
            row: &str,
            owner: &OwnerId,
            ttl: Duration,
        ) -> anyhow::Result<ClaimOutcome> {
            self.inner.try_claim(marker, row, owner, ttl).await
        }

        async fn try_release(
            &self,
            marker: &MarkerRef<'_>,
            row: &str,
            owner: &OwnerId,
        ) -> anyhow::Result<bool> {
            self.release_calls.lock().unwrap().push(row.to_string());
            if row == self.failing_row {
                anyhow::bail!("write timeout on row {}", row);
            }
            self.inner.try_release(marker, row, owner).await
        }

        async fn count_existing(
            &self,
            collection: &CollectionRef,
            rows: &[String],
        ) -> anyhow::Result<usize> {
            self.inner.count_existing(collection, rows).await
        }
    }

    #[tokio::test]
    async fn test_acquire_sets_every_marker() {
        let store = memory_store(&["r1", "r2", "r3"]);
        let manager = manager(store.clone());

        let lock = manager
            .acquire(collection(), Duration::from_secs(30), ["r1", "r2", "r3"])
            .await
            .unwrap();

        assert_eq!(lock.phase(), LockPhase::Acquired);
        assert_eq!(lock.ttl(), Duration::from_secs(60));
        assert_eq!(lock.timeout(), Duration::from_secs(30));
        assert_eq!(lock.restarts(), 0);
        for row in ["r1", "r2", "r3"] {
            assert_eq!(store.marker(&collection(), "[lock]", row), Some(lock.owner()));
        }
        assert_eq!(manager.stats().acquisitions, 1);
    }

    #[tokio::test]
    async fn test_release_clears_markers() {
        let store = memory_store(&["r1", "r2"]);
        let manager = manager(store.clone());

        let mut lock = manager
            .acquire(collection(), Duration::from_secs(30), ["r1", "r2"])
            .await
            .unwrap();
        lock.release().await.unwrap();

        assert_eq!(lock.phase(), LockPhase::Released);
        assert_eq!(store.marker(&collection(), "[lock]", "r1"), None);
        assert_eq!(store.marker(&collection(), "[lock]", "r2"), None);
        assert_eq!(manager.stats().releases, 1);
    }

    #[tokio::test]
    async fn test_release_skips_rows_owned_by_others() {
        let store = memory_store(&["r1"]);
        let manager = manager(store.clone());

        let mut lock = manager
            .acquire(collection(), Duration::from_secs(30), ["r1"])
            .await
            .unwrap();

        // Simulate expiry followed by another owner claiming the row
        let other = OwnerId::generate();
        store.set_marker(&collection(), "[lock]", "r1", Some(other));

        lock.release().await.unwrap();
        assert_eq!(store.marker(&collection(), "[lock]", "r1"), Some(other));
    }

    #[tokio::test]
    async fn test_missing_row_fails_and_releases_claimed_rows() {
        let store = memory_store(&["r1"]);
        let manager = manager(store.clone());

        let err = manager
            .acquire(collection(), Duration::from_secs(30), ["r1", "missing"])
            .await
            .unwrap_err();

        match err {
            LockError::RowNotFound {
                requested, found, ..
            } => {
                assert_eq!(requested, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.marker(&collection(), "[lock]", "r1"), None);
        assert_eq!(manager.stats().rows_not_found, 1);
    }

    #[tokio::test]
    async fn test_marker_flip_skips_existence_check() {
        let store = Arc::new(FlippingStore {
            inner: MemoryStore::new(),
            held_for: AtomicUsize::new(1),
            count_calls: AtomicUsize::new(0),
        });
        store.inner.insert_row(&collection(), "r1");
        let manager = LockManager::new(
            store.clone(),
            LockConfig::default().with_retry_interval(Duration::ZERO),
        );

        let lock = manager
            .acquire(collection(), Duration::from_secs(30), ["r1"])
            .await
            .unwrap();

        // One contended attempt triggers exactly one check; the retry that
        // finds the marker absent succeeds without another
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.inner.marker(&collection(), "[lock]", "r1"),
            Some(lock.owner())
        );
        assert_eq!(manager.stats().contended_claims, 1);
    }

    #[tokio::test]
    async fn test_uncontended_acquire_never_checks_rows() {
        let store = Arc::new(FlippingStore {
            inner: MemoryStore::new(),
            held_for: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
        });
        store.inner.insert_row(&collection(), "r1");
        store.inner.insert_row(&collection(), "r2");
        let manager = manager(store.clone());

        manager
            .acquire(collection(), Duration::from_secs(30), ["r1", "r2"])
            .await
            .unwrap();
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_release_stops_at_first_store_failure() {
        let store = Arc::new(FailingReleaseStore {
            inner: MemoryStore::new(),
            failing_row: "r2".to_string(),
            release_calls: Mutex::new(Vec::new()),
        });
        for row in ["r1", "r2", "r3"] {
            store.inner.insert_row(&collection(), row);
        }
        let manager = manager(store.clone());

        let mut lock = manager
            .acquire(collection(), Duration::from_secs(30), ["r1", "r2", "r3"])
            .await
            .unwrap();
        let err = lock.release().await.unwrap_err();

        assert!(err.is_store_failure());
        assert_eq!(*store.release_calls.lock().unwrap(), vec!["r1", "r2"]);
        assert_eq!(store.inner.marker(&collection(), "[lock]", "r1"), None);
        assert_eq!(
            store.inner.marker(&collection(), "[lock]", "r2"),
            Some(lock.owner())
        );
        assert_eq!(
            store.inner.marker(&collection(), "[lock]", "r3"),
            Some(lock.owner())
        );
        assert_eq!(lock.phase(), LockPhase::Acquired);
        assert_eq!(manager.stats().store_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_when_time_budget_runs_out() {
        let store = memory_store(&["r1", "r2"]);
        let messages = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink_messages = messages.clone();
        let manager = LockManager::new(
            store.clone(),
            LockConfig::default()
                .with_retry_interval(Duration::from_millis(10))
                .with_sink(Arc::new(move |m: &str| {
                    sink_messages.lock().unwrap().push(m.to_string());
                })),
        );

        // Someone else holds r2 for 15s; with a 10s timeout the 20s window of
        // the first attempt drops below 10s before r2 frees up
        let blocker = OwnerId::generate();
        let marker = MarkerRef {
            collection: &collection(),
            column: "[lock]",
        };
        assert!(
            store
                .try_claim(&marker, "r2", &blocker, Duration::from_secs(15))
                .await
                .unwrap()
                .applied
        );

        let start = Instant::now();
        let lock = manager
            .acquire(collection(), Duration::from_secs(10), ["r1", "r2"])
            .await
            .unwrap();

        // r1 from the abandoned attempt was cleared on restart; otherwise the
        // second attempt would wait for its marker to lapse at 20s
        assert!(start.elapsed() < Duration::from_secs(20));
        assert_eq!(lock.restarts(), 1);
        assert_eq!(manager.stats().restarts, 1);
        assert!(
            messages
                .lock()
                .unwrap()
                .iter()
                .any(|m| m == "cannot satisfy timeout, restarting acquire")
        );
        assert_eq!(store.marker(&collection(), "[lock]", "r1"), Some(lock.owner()));
        assert_eq!(store.marker(&collection(), "[lock]", "r2"), Some(lock.owner()));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let manager = manager(memory_store(&["r1"]));

        let err = manager
            .acquire(collection(), Duration::from_secs(1), Vec::<String>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::IllegalArgument(_)));

        let err = manager
            .acquire(collection(), Duration::ZERO, ["r1"])
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::IllegalArgument(_)));

        let err = manager
            .acquire(collection(), Duration::from_secs(1), ["r1", "r1"])
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::IllegalArgument(_)));
    }

    #[tokio::test]
    async fn test_timeout_beyond_clock_range_rejected() {
        let store = memory_store(&["r1"]);
        let manager = manager(store.clone());

        let err = manager
            .acquire(collection(), Duration::from_secs(u64::MAX / 4), ["r1"])
            .await
            .unwrap_err();
        assert!(matches!(err, LockError::IllegalArgument(_)));
        assert_eq!(store.marker(&collection(), "[lock]", "r1"), None);
    }

    #[tokio::test]
    async fn test_claim_failure_clears_rows_and_is_not_retried() {
        let store = Arc::new(FaultyStore::new(Some("r2"), false));
        for row in ["r1", "r2", "r3"] {
            store.inner.insert_row(&collection(), row);
        }
        let manager = manager(store.clone());

        let err = manager
            .acquire(collection(), Duration::from_secs(30), ["r1", "r2", "r3"])
            .await
            .unwrap_err();

        assert!(err.is_store_failure());
        assert_eq!(store.claim_calls.load(Ordering::SeqCst), 2);
        // r2's write applied before the error surfaced
        for row in ["r1", "r2", "r3"] {
            assert_eq!(store.inner.marker(&collection(), "[lock]", row), None);
        }
        assert_eq!(manager.stats().store_failures, 1);
        assert_eq!(manager.stats().acquisitions, 0);
    }

    #[tokio::test]
    async fn test_count_failure_clears_rows_and_is_not_retried() {
        let store = Arc::new(FaultyStore::new(None, true));
        for row in ["r1", "r2"] {
            store.inner.insert_row(&collection(), row);
        }
        let blocker = OwnerId::generate();
        store
            .inner
            .set_marker(&collection(), "[lock]", "r2", Some(blocker));
        let manager = manager(store.clone());

        let err = manager
            .acquire(collection(), Duration::from_secs(30), ["r1", "r2"])
            .await
            .unwrap_err();

        assert!(err.is_store_failure());
        assert_eq!(store.claim_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.count_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.inner.marker(&collection(), "[lock]", "r1"), None);
        assert_eq!(
            store.inner.marker(&collection(), "[lock]", "r2"),
            Some(blocker)
        );
        assert_eq!(manager.stats().store_failures, 1);
    }

    #[tokio::test]
    async fn test_sorted_rows() {
        let store = memory_store(&["a", "b", "c"]);
        let manager = LockManager::new(store, LockConfig::default().with_sorted_rows(true));

        let lock = manager
            .acquire(collection(), Duration::from_secs(5), ["c", "a", "b"])
            .await
            .unwrap();
        assert_eq!(lock.row_keys(), ["a", "b", "c"]);
    }

    proptest! {
        #[test]
        fn prop_ttl_is_twice_timeout(millis in 1u64..=86_400_000) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            let store = memory_store(&["r1"]);
            let manager = manager(store);
            let timeout = Duration::from_millis(millis);

            let lock = rt
                .block_on(manager.acquire(collection(), timeout, ["r1"]))
                .unwrap();
            prop_assert_eq!(lock.ttl(), timeout * 2);
        }
    }
}
