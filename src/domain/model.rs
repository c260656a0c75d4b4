use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::Result;
use crate::domain::event::UserEvent;

/// Activity status of a user.
///
/// The integer encoding is part of the event wire schema and must stay
/// stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    #[default]
    Blocked,
    Active,
    Deleted,
}

impl UserStatus {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Blocked => 0,
            Self::Active => 1,
            Self::Deleted => 2,
        }
    }
}

impl TryFrom<i32> for UserStatus {
    type Error = crate::core::ServiceError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Blocked),
            1 => Ok(Self::Active),
            2 => Ok(Self::Deleted),
            other => Err(crate::core::ServiceError::Codec(format!(
                "unknown user status {other}"
            ))),
        }
    }
}

/// The user aggregate root.
///
/// `login` is unique across all non-hard-deleted users and immutable
/// after creation; `email` and `telegram`, when set, are unique across
/// all users. A hard-deleted user has no row at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub status: UserStatus,
    pub login: String,
    pub email: Option<String>,
    pub telegram: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_contact_info(&self) -> bool {
        self.email.is_some() || self.telegram.is_some()
    }
}

/// Lookup specification for a user: by id, login, email or telegram.
#[derive(Debug, Clone, Default)]
pub struct FindSpec {
    pub user_id: Option<Uuid>,
    pub login: Option<String>,
    pub email: Option<String>,
    pub telegram: Option<String>,
}

impl FindSpec {
    pub fn by_id(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn by_login(login: &str) -> Self {
        Self {
            login: Some(login.to_string()),
            ..Self::default()
        }
    }

    pub fn by_email(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Self::default()
        }
    }

    pub fn by_telegram(telegram: &str) -> Self {
        Self {
            telegram: Some(telegram.to_string()),
            ..Self::default()
        }
    }

    /// All populated criteria must match.
    pub fn matches(&self, user: &User) -> bool {
        if let Some(id) = self.user_id
            && user.user_id != id
        {
            return false;
        }
        if let Some(login) = &self.login
            && &user.login != login
        {
            return false;
        }
        if let Some(email) = &self.email
            && user.email.as_ref() != Some(email)
        {
            return false;
        }
        if let Some(telegram) = &self.telegram
            && user.telegram.as_ref() != Some(telegram)
        {
            return false;
        }
        true
    }
}

/// Transactional access to user aggregate state.
///
/// Implementations are scoped to one unit of work: writes are staged and
/// become visible to other callers only when the enclosing transaction
/// commits.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Allocate a new aggregate id. Ids are generated once and never reused.
    async fn next_id(&self) -> Result<Uuid>;

    /// Upsert the user by id.
    async fn store(&self, user: User) -> Result<()>;

    /// Find a single user matching the spec, or `NotFound`.
    async fn find(&self, spec: FindSpec) -> Result<User>;

    /// Physically remove the row, freeing login/email/telegram for reuse.
    async fn hard_delete(&self, user_id: Uuid) -> Result<()>;
}

/// Sink for domain events produced by the invariant service.
///
/// The outbox implementation appends the serialized event in the same
/// transaction as the aggregate write; it never publishes synchronously.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: UserEvent) -> Result<()>;
}
