use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{Instrument, Level, event, info_span};

use crate::core::{LockConfig, Result, ServiceError};
use crate::uow::lock::{LockGuard, LockManager, LockName};
use crate::uow::store::{Store, TxnScope};

/// Locks held for one unit of work, released in reverse acquisition
/// order when dropped, on every exit path.
#[derive(Default)]
struct AcquiredLocks(Vec<LockGuard>);

impl AcquiredLocks {
    fn push(&mut self, guard: LockGuard) {
        self.0.push(guard);
    }
}

impl Drop for AcquiredLocks {
    fn drop(&mut self) {
        while let Some(guard) = self.0.pop() {
            drop(guard);
        }
    }
}

/// Serializes conflicting mutations: acquires named locks in caller
/// order, then runs a closure inside a fresh transaction. Two writers
/// contending for overlapping lock sets are strictly serialized in
/// acquisition order; writers with disjoint sets proceed in parallel.
pub struct LockingExecutor<S: Store> {
    store: Arc<S>,
    locks: Arc<dyn LockManager>,
    config: LockConfig,
}

impl<S: Store> LockingExecutor<S> {
    pub fn new(store: Arc<S>, locks: Arc<dyn LockManager>, config: LockConfig) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run `f` transactionally without any lock. Used for read-only or
    /// already-serialized paths.
    pub async fn execute<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t S::Txn) -> BoxFuture<'t, Result<T>> + Send,
    {
        let txn = self.store.begin().await?;
        match f(&txn).await {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    event!(Level::WARN, error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Acquire `lock_names` in order, all-or-nothing, then run `f`
    /// inside a transaction. `f` never runs unless every lock is held;
    /// locks are released in reverse order after commit or rollback.
    pub async fn execute_locked<T, F>(&self, lock_names: &[LockName], f: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t S::Txn) -> BoxFuture<'t, Result<T>> + Send,
    {
        let span = info_span!("uow.execute_locked", locks = lock_names.len());
        async {
            let _held = self.acquire_all(lock_names).await?;
            self.execute(f).await
        }
        .instrument(span)
        .await
    }

    /// Like [`Self::execute_locked`], but the unit of work is aborted
    /// once `deadline` elapses. Held locks are still released on unwind.
    pub async fn execute_locked_with_deadline<T, F>(
        &self,
        lock_names: &[LockName],
        deadline: Duration,
        f: F,
    ) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t S::Txn) -> BoxFuture<'t, Result<T>> + Send,
    {
        let _held = self.acquire_all(lock_names).await?;
        match tokio::time::timeout(deadline, self.execute(f)).await {
            Ok(result) => result,
            Err(_) => {
                event!(Level::WARN, ?deadline, "unit of work deadline exceeded");
                Err(ServiceError::Transient(
                    "unit of work deadline exceeded".to_string(),
                ))
            }
        }
    }

    async fn acquire_all(&self, lock_names: &[LockName]) -> Result<AcquiredLocks> {
        let ttl = self.config.ttl();
        let wait = self.config.acquire_timeout();

        let mut held = AcquiredLocks::default();
        for name in lock_names {
            // On failure, `held` drops here and releases the prefix in
            // reverse order.
            let guard = self.locks.acquire(name, ttl, wait).await?;
            event!(Level::TRACE, lock = %name, "lock acquired");
            held.push(guard);
        }
        Ok(held)
    }
}
