//! Explicit serializer/deserializer per event kind, selected by the
//! event type tag.
//!
//! Schema: field names as below, integer-encoded status, epoch-second
//! timestamps, optional fields omitted when absent. Decoding a
//! `user_updated` payload must reconstruct the same updated/removed
//! partition as was serialized; a field appearing in both is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Result, ServiceError};
use crate::domain::event::{
    FieldChange, USER_CREATED, USER_DELETED, USER_UPDATED, UserCreated, UserDeleted, UserEvent,
    UserUpdated,
};
use crate::domain::model::UserStatus;

#[derive(Debug, Serialize, Deserialize)]
struct UserCreatedWire {
    user_id: String,
    status: i32,
    login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    telegram: Option<String>,
    created_at: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UpdatedFieldsWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    telegram: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RemovedFieldsWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    telegram: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserUpdatedWire {
    user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_fields: Option<UpdatedFieldsWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    removed_fields: Option<RemovedFieldsWire>,
    updated_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserDeletedWire {
    user_id: String,
    status: i32,
    deleted_at: i64,
    hard: bool,
}

/// Serialize an event to its JSON payload. The type tag travels
/// separately (outbox record / delivery `kind`).
pub fn encode(event: &UserEvent) -> Result<String> {
    match event {
        UserEvent::Created(e) => encode_created(e),
        UserEvent::Updated(e) => encode_updated(e),
        UserEvent::Deleted(e) => encode_deleted(e),
    }
}

/// Decode a payload by its type tag. Unknown tags are a codec error;
/// callers that must stay forward-compatible check the tag first.
pub fn decode(event_type: &str, payload: &[u8]) -> Result<UserEvent> {
    match event_type {
        USER_CREATED => decode_created(payload),
        USER_UPDATED => decode_updated(payload),
        USER_DELETED => decode_deleted(payload),
        other => Err(ServiceError::Codec(format!("unknown event type {other:?}"))),
    }
}

fn encode_created(event: &UserCreated) -> Result<String> {
    let wire = UserCreatedWire {
        user_id: event.user_id.to_string(),
        status: event.status.as_i32(),
        login: event.login.clone(),
        email: event.email.clone(),
        telegram: event.telegram.clone(),
        created_at: event.created_at.timestamp(),
    };
    Ok(serde_json::to_string(&wire)?)
}

fn decode_created(payload: &[u8]) -> Result<UserEvent> {
    let wire: UserCreatedWire = serde_json::from_slice(payload)?;
    Ok(UserEvent::Created(UserCreated {
        user_id: parse_uuid(&wire.user_id)?,
        status: UserStatus::try_from(wire.status)?,
        login: wire.login,
        email: wire.email,
        telegram: wire.telegram,
        created_at: parse_timestamp(wire.created_at)?,
    }))
}

fn encode_updated(event: &UserUpdated) -> Result<String> {
    let mut updated = UpdatedFieldsWire {
        status: event.status.map(UserStatus::as_i32),
        ..UpdatedFieldsWire::default()
    };
    let mut removed = RemovedFieldsWire::default();

    match &event.email {
        FieldChange::Unchanged => {}
        FieldChange::Set(value) => updated.email = Some(value.clone()),
        FieldChange::Cleared => removed.email = Some(true),
    }
    match &event.telegram {
        FieldChange::Unchanged => {}
        FieldChange::Set(value) => updated.telegram = Some(value.clone()),
        FieldChange::Cleared => removed.telegram = Some(true),
    }

    let has_updates = updated.status.is_some() || updated.email.is_some() || updated.telegram.is_some();
    let has_removals = removed.email.is_some() || removed.telegram.is_some();
    let wire = UserUpdatedWire {
        user_id: event.user_id.to_string(),
        updated_fields: has_updates.then_some(updated),
        removed_fields: has_removals.then_some(removed),
        updated_at: event.updated_at.timestamp(),
    };
    Ok(serde_json::to_string(&wire)?)
}

fn decode_updated(payload: &[u8]) -> Result<UserEvent> {
    let wire: UserUpdatedWire = serde_json::from_slice(payload)?;
    let updated = wire.updated_fields.unwrap_or_default();
    let removed = wire.removed_fields.unwrap_or_default();

    let email = field_change("email", updated.email, removed.email)?;
    let telegram = field_change("telegram", updated.telegram, removed.telegram)?;
    let status = updated.status.map(UserStatus::try_from).transpose()?;

    Ok(UserEvent::Updated(UserUpdated {
        user_id: parse_uuid(&wire.user_id)?,
        status,
        email,
        telegram,
        updated_at: parse_timestamp(wire.updated_at)?,
    }))
}

fn encode_deleted(event: &UserDeleted) -> Result<String> {
    let wire = UserDeletedWire {
        user_id: event.user_id.to_string(),
        status: event.status.as_i32(),
        deleted_at: event.deleted_at.timestamp(),
        hard: event.hard,
    };
    Ok(serde_json::to_string(&wire)?)
}

fn decode_deleted(payload: &[u8]) -> Result<UserEvent> {
    let wire: UserDeletedWire = serde_json::from_slice(payload)?;
    Ok(UserEvent::Deleted(UserDeleted {
        user_id: parse_uuid(&wire.user_id)?,
        status: UserStatus::try_from(wire.status)?,
        deleted_at: parse_timestamp(wire.deleted_at)?,
        hard: wire.hard,
    }))
}

fn field_change(
    field: &str,
    updated: Option<String>,
    removed: Option<bool>,
) -> Result<FieldChange<String>> {
    match (updated, removed) {
        (Some(_), Some(true)) => Err(ServiceError::Codec(format!(
            "field {field:?} marked both updated and removed"
        ))),
        (Some(value), _) => Ok(FieldChange::Set(value)),
        (None, Some(true)) => Ok(FieldChange::Cleared),
        (None, _) => Ok(FieldChange::Unchanged),
    }
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|err| ServiceError::Codec(err.to_string()))
}

fn parse_timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ServiceError::Codec(format!("timestamp {secs} out of range")))
}
