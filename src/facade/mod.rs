use futures::FutureExt;
use tracing::{Level, event};
use uuid::Uuid;

use crate::core::Result;
use crate::domain::model::{FindSpec, UserStatus};
use crate::domain::service::UserDomainService;
use crate::outbox::dispatcher::OutboxEventDispatcher;
use crate::uow::executor::LockingExecutor;
use crate::uow::lock::LockName;
use crate::uow::store::{Store, TxnScope};

/// Command payload for [`UserFacade::store_user`]: create when
/// `user_id` is absent, update otherwise.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub user_id: Option<Uuid>,
    pub login: String,
    pub email: Option<String>,
    pub telegram: Option<String>,
}

/// Application-level view of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSnapshot {
    pub user_id: Uuid,
    pub status: UserStatus,
    pub login: String,
    pub email: Option<String>,
    pub telegram: Option<String>,
}

/// Application service over the user aggregate.
///
/// Each write use case computes its lock-name set deterministically,
/// then runs the domain invariant service inside a locked unit of work
/// with the outbox as its event sink.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use userguard::{
///     LockingExecutor, MemoryLockManager, MemoryStore, ServiceConfig, UserFacade, UserInput,
/// };
///
/// # #[tokio::main]
/// # async fn main() -> userguard::Result<()> {
/// let config = ServiceConfig::default();
/// let store = Arc::new(MemoryStore::new());
/// let locks = Arc::new(MemoryLockManager::new());
/// let executor = LockingExecutor::new(Arc::clone(&store), locks, config.lock.clone());
/// let facade = UserFacade::new(executor);
///
/// let user_id = facade
///     .store_user(UserInput {
///         user_id: None,
///         login: "alice".to_string(),
///         email: Some("alice@example.com".to_string()),
///         telegram: None,
///     })
///     .await?;
///
/// let user = facade.find_user(user_id).await?;
/// assert_eq!(user.login, "alice");
/// # Ok(())
/// # }
/// ```
pub struct UserFacade<S: Store> {
    executor: LockingExecutor<S>,
}

impl<S: Store> UserFacade<S> {
    pub fn new(executor: LockingExecutor<S>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &LockingExecutor<S> {
        &self.executor
    }

    /// Create or update a user's identity attributes.
    ///
    /// Inside one locked unit of work: create when no id is given, then
    /// apply email, then telegram. Each attribute change emits its own
    /// event; changes are never batched into one.
    pub async fn store_user(&self, input: UserInput) -> Result<Uuid> {
        let lock_names = Self::store_locks(&input);
        event!(Level::DEBUG, login = %input.login, locks = lock_names.len(), "store user");

        self.executor
            .execute_locked(&lock_names, move |txn| {
                async move {
                    let dispatcher = OutboxEventDispatcher::new(txn.outbox());
                    let service = UserDomainService::new(txn.users(), &dispatcher);

                    let user_id = match input.user_id {
                        Some(id) => id,
                        None => service.create_user(&input.login).await?,
                    };
                    service.update_email(user_id, input.email).await?;
                    service.update_telegram(user_id, input.telegram).await?;
                    Ok(user_id)
                }
                .boxed()
            })
            .await
    }

    /// Status-only change: locks just the id.
    pub async fn set_user_status(&self, user_id: Uuid, status: UserStatus) -> Result<()> {
        self.executor
            .execute_locked(&[LockName::User(user_id)], move |txn| {
                async move {
                    let dispatcher = OutboxEventDispatcher::new(txn.outbox());
                    UserDomainService::new(txn.users(), &dispatcher)
                        .update_status(user_id, status)
                        .await
                }
                .boxed()
            })
            .await
    }

    /// Point read used by the saga's activities.
    pub async fn find_user(&self, user_id: Uuid) -> Result<UserSnapshot> {
        self.executor
            .execute_locked(&[LockName::User(user_id)], move |txn| {
                async move {
                    let user = txn.users().find(FindSpec::by_id(user_id)).await?;
                    Ok(UserSnapshot {
                        user_id: user.user_id,
                        status: user.status,
                        login: user.login,
                        email: user.email,
                        telegram: user.telegram,
                    })
                }
                .boxed()
            })
            .await
    }

    /// Delete a user, softly or physically.
    pub async fn delete_user(&self, user_id: Uuid, hard: bool) -> Result<()> {
        self.executor
            .execute_locked(&[LockName::User(user_id)], move |txn| {
                async move {
                    let dispatcher = OutboxEventDispatcher::new(txn.outbox());
                    UserDomainService::new(txn.users(), &dispatcher)
                        .delete_user(user_id, hard)
                        .await
                }
                .boxed()
            })
            .await
    }

    // Fixed lock order: identifying attribute (id if known, else
    // login), then email, then telegram. Two concurrent calls touching
    // overlapping attribute sets always request locks in the same
    // relative order and cannot deadlock against each other. Do not
    // reorder.
    fn store_locks(input: &UserInput) -> Vec<LockName> {
        let mut names = vec![match input.user_id {
            Some(id) => LockName::User(id),
            None => LockName::Login(input.login.clone()),
        }];
        if let Some(email) = &input.email {
            names.push(LockName::Email(email.clone()));
        }
        if let Some(telegram) = &input.telegram {
            names.push(LockName::Telegram(telegram.clone()));
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_locks_follow_fixed_order() {
        let input = UserInput {
            user_id: None,
            login: "alice".to_string(),
            email: Some("a@b.c".to_string()),
            telegram: Some("@alice".to_string()),
        };
        let names = UserFacade::<crate::storage::MemoryStore>::store_locks(&input);
        assert_eq!(
            names,
            vec![
                LockName::Login("alice".to_string()),
                LockName::Email("a@b.c".to_string()),
                LockName::Telegram("@alice".to_string()),
            ]
        );

        let id = Uuid::now_v7();
        let input = UserInput {
            user_id: Some(id),
            login: "alice".to_string(),
            email: None,
            telegram: Some("@alice".to_string()),
        };
        let names = UserFacade::<crate::storage::MemoryStore>::store_locks(&input);
        assert_eq!(
            names,
            vec![
                LockName::User(id),
                LockName::Telegram("@alice".to_string()),
            ]
        );
    }
}
