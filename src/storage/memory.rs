//! In-memory reference implementation of the storage collaborator:
//! transactional user table, committed outbox, and the named-lock
//! table. Serves tests and the demo binary; a production deployment
//! plugs a real storage engine behind the same traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::sleep;
use uuid::Uuid;

use crate::core::{Result, ServiceError};
use crate::domain::model::{FindSpec, User, UserRepository};
use crate::outbox::record::{OutboxAppend, OutboxReader, OutboxRecord, OutboxStatus};
use crate::uow::lock::{LockGuard, LockManager, LockName};
use crate::uow::store::{Store, TxnScope};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    outbox: Vec<OutboxRecord>,
}

/// In-memory transactional store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed state of one user, if any row exists.
    pub async fn committed_user(&self, user_id: Uuid) -> Option<User> {
        self.tables.read().await.users.get(&user_id).cloned()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// All committed outbox records, in append order.
    pub async fn outbox_records(&self) -> Vec<OutboxRecord> {
        self.tables.read().await.outbox.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Txn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn> {
        Ok(MemoryTxn {
            tables: Arc::clone(&self.tables),
            staging: StdMutex::new(Staging::default()),
        })
    }
}

#[derive(Default)]
struct Staging {
    upserts: Vec<User>,
    deletes: Vec<Uuid>,
    outbox: Vec<OutboxRecord>,
}

/// One open unit of work over the in-memory tables. Writes are staged
/// locally and applied under a single write lock on commit, so they
/// become visible atomically.
pub struct MemoryTxn {
    tables: Arc<RwLock<Tables>>,
    staging: StdMutex<Staging>,
}

#[async_trait]
impl UserRepository for MemoryTxn {
    async fn next_id(&self) -> Result<Uuid> {
        Ok(Uuid::now_v7())
    }

    async fn store(&self, user: User) -> Result<()> {
        self.staging.lock()?.upserts.push(user);
        Ok(())
    }

    async fn find(&self, spec: FindSpec) -> Result<User> {
        let tables = self.tables.read().await;
        let staging = self.staging.lock()?;

        // Staged writes shadow committed rows; newest staged write wins.
        for user in staging.upserts.iter().rev() {
            if staging.deletes.contains(&user.user_id) {
                continue;
            }
            if spec.matches(user) {
                return Ok(user.clone());
            }
        }
        for user in tables.users.values() {
            if staging.deletes.contains(&user.user_id) {
                continue;
            }
            if staging.upserts.iter().any(|u| u.user_id == user.user_id) {
                continue;
            }
            if spec.matches(user) {
                return Ok(user.clone());
            }
        }
        Err(ServiceError::NotFound)
    }

    async fn hard_delete(&self, user_id: Uuid) -> Result<()> {
        self.staging.lock()?.deletes.push(user_id);
        Ok(())
    }
}

#[async_trait]
impl OutboxAppend for MemoryTxn {
    async fn append(&self, record: OutboxRecord) -> Result<()> {
        self.staging.lock()?.outbox.push(record);
        Ok(())
    }
}

#[async_trait]
impl TxnScope for MemoryTxn {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn outbox(&self) -> &dyn OutboxAppend {
        self
    }

    async fn commit(&self) -> Result<()> {
        let staged = {
            let mut staging = self.staging.lock()?;
            std::mem::take(&mut *staging)
        };

        let mut tables = self.tables.write().await;
        for user in staged.upserts {
            tables.users.insert(user.user_id, user);
        }
        for user_id in staged.deletes {
            tables.users.remove(&user_id);
        }
        tables.outbox.extend(staged.outbox);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut staging = self.staging.lock()?;
        *staging = Staging::default();
        Ok(())
    }
}

#[async_trait]
impl OutboxReader for MemoryStore {
    async fn load_pending(&self, transport_name: &str, limit: usize) -> Result<Vec<OutboxRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .outbox
            .iter()
            .filter(|r| r.transport_name == transport_name && r.status == OutboxStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_dispatched(&self, record_id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        let record = tables
            .outbox
            .iter_mut()
            .find(|r| r.record_id == record_id)
            .ok_or_else(|| {
                ServiceError::Transient(format!("outbox record {record_id} not found"))
            })?;
        record.status = OutboxStatus::Dispatched;
        Ok(())
    }
}

struct Lease {
    lease_id: u64,
    expires_at: Instant,
}

const ACQUIRE_RETRY_INTERVAL: Duration = Duration::from_millis(5);

/// Named locks backed by the (in-memory) storage engine. Leases expire
/// after their TTL, so a crashed holder cannot wedge an aggregate; a
/// stale guard never releases a lease it no longer owns.
#[derive(Default)]
pub struct MemoryLockManager {
    table: Arc<StdMutex<HashMap<String, Lease>>>,
    next_lease_id: AtomicU64,
}

impl MemoryLockManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockManager for MemoryLockManager {
    async fn acquire(&self, name: &LockName, ttl: Duration, wait: Duration) -> Result<LockGuard> {
        let key = name.key();
        let deadline = Instant::now() + wait;

        loop {
            let now = Instant::now();
            {
                let mut table = self.table.lock()?;
                let free = match table.get(&key) {
                    None => true,
                    Some(lease) => lease.expires_at <= now,
                };
                if free {
                    let lease_id = self.next_lease_id.fetch_add(1, Ordering::Relaxed);
                    table.insert(
                        key.clone(),
                        Lease {
                            lease_id,
                            expires_at: now + ttl,
                        },
                    );

                    let table_ref = Arc::clone(&self.table);
                    let held_key = key.clone();
                    return Ok(LockGuard::new(move || {
                        if let Ok(mut table) = table_ref.lock()
                            && table.get(&held_key).is_some_and(|l| l.lease_id == lease_id)
                        {
                            table.remove(&held_key);
                        }
                    }));
                }
            }

            if Instant::now() >= deadline {
                return Err(ServiceError::LockUnavailable(key));
            }
            sleep(ACQUIRE_RETRY_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::UserStatus;
    use chrono::Utc;

    fn user(login: &str) -> User {
        let now = Utc::now();
        User {
            user_id: Uuid::now_v7(),
            status: UserStatus::Blocked,
            login: login.to_string(),
            email: None,
            telegram: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn rollback_discards_staged_writes_and_outbox() {
        let store = MemoryStore::new();
        let txn = store.begin().await.unwrap();

        txn.users().store(user("alice")).await.unwrap();
        txn.outbox()
            .append(OutboxRecord::new("domain", "user_created", "{}"))
            .await
            .unwrap();
        txn.rollback().await.unwrap();
        txn.commit().await.unwrap();

        assert_eq!(store.user_count().await, 0);
        assert!(store.outbox_records().await.is_empty());
    }

    #[tokio::test]
    async fn staged_writes_visible_within_transaction_only() {
        let store = MemoryStore::new();
        let txn = store.begin().await.unwrap();
        txn.users().store(user("bob")).await.unwrap();

        let found = txn.users().find(FindSpec::by_login("bob")).await.unwrap();
        assert_eq!(found.login, "bob");

        let other = store.begin().await.unwrap();
        let missing = other.users().find(FindSpec::by_login("bob")).await;
        assert!(matches!(missing, Err(ServiceError::NotFound)));

        txn.commit().await.unwrap();
        let visible = other.users().find(FindSpec::by_login("bob")).await;
        assert!(visible.is_ok());
    }

    #[tokio::test]
    async fn expired_lease_can_be_stolen_and_stale_guard_is_inert() {
        let locks = MemoryLockManager::new();
        let name = LockName::Login("alice".to_string());

        let stale = locks
            .acquire(&name, Duration::from_millis(20), Duration::from_millis(10))
            .await
            .unwrap();
        sleep(Duration::from_millis(40)).await;

        // TTL elapsed: a second caller may take the lock over.
        let fresh = locks
            .acquire(&name, Duration::from_secs(60), Duration::from_millis(10))
            .await
            .unwrap();

        // Dropping the stale guard must not release the fresh lease.
        drop(stale);
        let contended = locks
            .acquire(&name, Duration::from_secs(60), Duration::from_millis(30))
            .await;
        assert!(matches!(contended, Err(ServiceError::LockUnavailable(_))));

        drop(fresh);
        let reacquired = locks
            .acquire(&name, Duration::from_secs(60), Duration::from_millis(30))
            .await;
        assert!(reacquired.is_ok());
    }
}
