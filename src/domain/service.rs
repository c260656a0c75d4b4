use chrono::Utc;
use tracing::{Level, event};
use uuid::Uuid;

use crate::core::{Result, ServiceError};
use crate::domain::event::{FieldChange, UserCreated, UserDeleted, UserEvent};
use crate::domain::model::{EventDispatcher, FindSpec, User, UserRepository, UserStatus};

/// Pure business logic over a single user aggregate.
///
/// Enforces the uniqueness invariants and emits exactly one domain event
/// per successful mutation. Uniqueness checks and the subsequent write
/// are not atomic by themselves: every call must already run inside a
/// locked unit of work holding the relevant attribute locks. This
/// service performs no locking itself.
pub struct UserDomainService<'a> {
    repository: &'a dyn UserRepository,
    events: &'a dyn EventDispatcher,
}

impl<'a> UserDomainService<'a> {
    pub fn new(repository: &'a dyn UserRepository, events: &'a dyn EventDispatcher) -> Self {
        Self { repository, events }
    }

    /// Create a user with the given login and default status.
    pub async fn create_user(&self, login: &str) -> Result<Uuid> {
        match self.repository.find(FindSpec::by_login(login)).await {
            Ok(_) => return Err(ServiceError::LoginAlreadyUsed),
            Err(ServiceError::NotFound) => {}
            Err(err) => return Err(err),
        }

        let user_id = self.repository.next_id().await?;
        let now = Utc::now();
        let status = UserStatus::default();
        self.repository
            .store(User {
                user_id,
                status,
                login: login.to_string(),
                email: None,
                telegram: None,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .await?;

        event!(Level::DEBUG, user_id = %user_id, login, "user created");
        self.events
            .dispatch(UserEvent::Created(UserCreated {
                user_id,
                status,
                login: login.to_string(),
                email: None,
                telegram: None,
                created_at: now,
            }))
            .await?;
        Ok(user_id)
    }

    /// Set the user's status. No write and no event when unchanged.
    pub async fn update_status(&self, user_id: Uuid, status: UserStatus) -> Result<()> {
        let mut user = self.repository.find(FindSpec::by_id(user_id)).await?;
        if user.status == status {
            return Ok(());
        }

        let now = Utc::now();
        user.status = status;
        user.updated_at = now;
        self.repository.store(user).await?;

        event!(Level::DEBUG, user_id = %user_id, status = status.as_i32(), "user status updated");
        self.events
            .dispatch(UserEvent::status_updated(user_id, status, now))
            .await
    }

    /// Set or clear the user's email. No write and no event when the
    /// value is unchanged (including clearing an already absent one).
    pub async fn update_email(&self, user_id: Uuid, email: Option<String>) -> Result<()> {
        let mut user = self.repository.find(FindSpec::by_id(user_id)).await?;
        if user.email == email {
            return Ok(());
        }

        if let Some(email) = &email {
            match self.repository.find(FindSpec::by_email(email)).await {
                Ok(owner) if owner.user_id != user.user_id => {
                    return Err(ServiceError::EmailAlreadyUsed);
                }
                Ok(_) | Err(ServiceError::NotFound) => {}
                Err(err) => return Err(err),
            }
        }

        let now = Utc::now();
        user.email = email.clone();
        user.updated_at = now;
        self.repository.store(user).await?;

        let change = match email {
            Some(value) => FieldChange::Set(value),
            None => FieldChange::Cleared,
        };
        event!(Level::DEBUG, user_id = %user_id, "user email updated");
        self.events
            .dispatch(UserEvent::email_changed(user_id, change, now))
            .await
    }

    /// Set or clear the user's telegram handle. Symmetric to
    /// [`Self::update_email`].
    pub async fn update_telegram(&self, user_id: Uuid, telegram: Option<String>) -> Result<()> {
        let mut user = self.repository.find(FindSpec::by_id(user_id)).await?;
        if user.telegram == telegram {
            return Ok(());
        }

        if let Some(telegram) = &telegram {
            match self.repository.find(FindSpec::by_telegram(telegram)).await {
                Ok(owner) if owner.user_id != user.user_id => {
                    return Err(ServiceError::TelegramAlreadyUsed);
                }
                Ok(_) | Err(ServiceError::NotFound) => {}
                Err(err) => return Err(err),
            }
        }

        let now = Utc::now();
        user.telegram = telegram.clone();
        user.updated_at = now;
        self.repository.store(user).await?;

        let change = match telegram {
            Some(value) => FieldChange::Set(value),
            None => FieldChange::Cleared,
        };
        event!(Level::DEBUG, user_id = %user_id, "user telegram updated");
        self.events
            .dispatch(UserEvent::telegram_changed(user_id, change, now))
            .await
    }

    /// Delete the user. A hard delete removes the row entirely, freeing
    /// login/email/telegram for reuse; a soft delete only marks the
    /// status and `deleted_at`.
    pub async fn delete_user(&self, user_id: Uuid, hard: bool) -> Result<()> {
        let mut user = self.repository.find(FindSpec::by_id(user_id)).await?;

        let now = Utc::now();
        if hard {
            self.repository.hard_delete(user_id).await?;
        } else {
            user.status = UserStatus::Deleted;
            user.updated_at = now;
            user.deleted_at = Some(now);
            self.repository.store(user).await?;
        }

        event!(Level::DEBUG, user_id = %user_id, hard, "user deleted");
        self.events
            .dispatch(UserEvent::Deleted(UserDeleted {
                user_id,
                status: UserStatus::Deleted,
                deleted_at: now,
                hard,
            }))
            .await
    }
}
