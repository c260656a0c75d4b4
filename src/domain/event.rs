use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::model::UserStatus;

/// Change applied to one optional attribute.
///
/// A single event can never claim an attribute was both updated and
/// removed: the variant is the partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldChange<T> {
    #[default]
    Unchanged,
    Set(T),
    Cleared,
}

impl<T> FieldChange<T> {
    pub fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Fact: a user was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCreated {
    pub user_id: Uuid,
    pub status: UserStatus,
    pub login: String,
    pub email: Option<String>,
    pub telegram: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fact: exactly one attribute of a user changed.
///
/// The invariant service never batches multiple attribute changes into
/// one event; at most one of `status`, `email`, `telegram` carries a
/// change here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdated {
    pub user_id: Uuid,
    pub status: Option<UserStatus>,
    pub email: FieldChange<String>,
    pub telegram: FieldChange<String>,
    pub updated_at: DateTime<Utc>,
}

impl UserUpdated {
    /// True iff the change touches email or telegram. The
    /// status-reconciliation saga only reacts to these.
    pub fn contact_info_changed(&self) -> bool {
        self.email.is_changed() || self.telegram.is_changed()
    }
}

/// Fact: a user was deleted, softly or physically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDeleted {
    pub user_id: Uuid,
    pub status: UserStatus,
    pub deleted_at: DateTime<Utc>,
    pub hard: bool,
}

/// Domain event over the user aggregate. Events are facts about one
/// committed state transition; once handed to the outbox they are owned
/// by the messaging fabric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    Created(UserCreated),
    Updated(UserUpdated),
    Deleted(UserDeleted),
}

pub const USER_CREATED: &str = "user_created";
pub const USER_UPDATED: &str = "user_updated";
pub const USER_DELETED: &str = "user_deleted";

impl UserEvent {
    /// Stable type tag, used as the wire schema selector and as the
    /// routing-key suffix.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Created(_) => USER_CREATED,
            Self::Updated(_) => USER_UPDATED,
            Self::Deleted(_) => USER_DELETED,
        }
    }

    pub fn status_updated(user_id: Uuid, status: UserStatus, updated_at: DateTime<Utc>) -> Self {
        Self::Updated(UserUpdated {
            user_id,
            status: Some(status),
            email: FieldChange::Unchanged,
            telegram: FieldChange::Unchanged,
            updated_at,
        })
    }

    pub fn email_changed(
        user_id: Uuid,
        change: FieldChange<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self::Updated(UserUpdated {
            user_id,
            status: None,
            email: change,
            telegram: FieldChange::Unchanged,
            updated_at,
        })
    }

    pub fn telegram_changed(
        user_id: Uuid,
        change: FieldChange<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self::Updated(UserUpdated {
            user_id,
            status: None,
            email: FieldChange::Unchanged,
            telegram: change,
            updated_at,
        })
    }
}
