use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::Result;

/// Name of a distributed lock, namespaced by attribute kind so that
/// locks on different kinds with coincidentally equal values never
/// collide. Locks are keyed by attribute value, not aggregate id, so
/// concurrent creation attempts with the same not-yet-assigned login
/// also serialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockName {
    User(Uuid),
    Login(String),
    Email(String),
    Telegram(String),
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user_{id}"),
            Self::Login(login) => write!(f, "user_login_{login}"),
            Self::Email(email) => write!(f, "user_email_{email}"),
            Self::Telegram(telegram) => write!(f, "user_telegram_{telegram}"),
        }
    }
}

impl LockName {
    pub fn key(&self) -> String {
        self.to_string()
    }
}

/// RAII lease on a named lock. Dropping the guard releases the lease;
/// release on every exit path follows from scope unwinding.
pub struct LockGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("held", &self.release.is_some())
            .finish()
    }
}

/// Acquisition of named locks with a bounded lease TTL.
///
/// The production implementation is backed by the storage engine; the
/// in-memory one lives in [`crate::storage::memory`].
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Acquire `name` with the given lease TTL, waiting at most `wait`
    /// for a contended lock. Failure to acquire yields
    /// `LockUnavailable` and nothing is held.
    async fn acquire(&self, name: &LockName, ttl: Duration, wait: Duration) -> Result<LockGuard>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_names_are_namespaced_by_kind() {
        let value = "x@y.z".to_string();
        assert_ne!(
            LockName::Email(value.clone()).key(),
            LockName::Telegram(value.clone()).key()
        );
        assert_ne!(
            LockName::Login(value.clone()).key(),
            LockName::Email(value).key()
        );
    }

    #[test]
    fn guard_runs_release_once_on_drop() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicU32, Ordering};

        let counter = Arc::new(AtomicU32::new(0));
        let captured = Arc::clone(&counter);
        let guard = LockGuard::new(move || {
            captured.fetch_add(1, Ordering::SeqCst);
        });
        drop(guard);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
