/// Wire codec tests
///
/// Schema shape (integer status, epoch-second timestamps, omitted
/// optionals, updated/removed partition) and round trips per event kind.
/// Run with: cargo test --test event_codec_tests

use chrono::DateTime;
use uuid::Uuid;

use userguard::{
    FieldChange, UserEvent, UserStatus,
    domain::event::{UserCreated, UserDeleted, UserUpdated},
    wire,
};

fn ts(secs: i64) -> chrono::DateTime<chrono::Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

#[test]
fn created_event_round_trips_with_optionals() {
    let event = UserEvent::Created(UserCreated {
        user_id: Uuid::now_v7(),
        status: UserStatus::Blocked,
        login: "alice".to_string(),
        email: Some("alice@example.com".to_string()),
        telegram: None,
        created_at: ts(1_700_000_000),
    });

    let payload = wire::encode(&event).unwrap();
    let decoded = wire::decode("user_created", payload.as_bytes()).unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn created_wire_shape_uses_integers_and_omits_absent_fields() {
    let event = UserEvent::Created(UserCreated {
        user_id: Uuid::now_v7(),
        status: UserStatus::Blocked,
        login: "alice".to_string(),
        email: None,
        telegram: None,
        created_at: ts(1_700_000_000),
    });

    let payload = wire::encode(&event).unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(value["status"], 0);
    assert_eq!(value["created_at"], 1_700_000_000i64);
    assert!(value.get("email").is_none());
    assert!(value.get("telegram").is_none());
}

#[test]
fn status_only_update_round_trips() {
    let event = UserEvent::status_updated(Uuid::now_v7(), UserStatus::Active, ts(1_700_000_100));

    let payload = wire::encode(&event).unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(value["updated_fields"]["status"], 1);
    assert!(value.get("removed_fields").is_none());

    let decoded = wire::decode("user_updated", payload.as_bytes()).unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn mixed_update_keeps_the_partition() {
    let event = UserEvent::Updated(UserUpdated {
        user_id: Uuid::now_v7(),
        status: None,
        email: FieldChange::Set("new@example.com".to_string()),
        telegram: FieldChange::Cleared,
        updated_at: ts(1_700_000_200),
    });

    let payload = wire::encode(&event).unwrap();
    let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(value["updated_fields"]["email"], "new@example.com");
    assert!(value["updated_fields"].get("telegram").is_none());
    assert_eq!(value["removed_fields"]["telegram"], true);
    assert!(value["removed_fields"].get("email").is_none());

    let decoded = wire::decode("user_updated", payload.as_bytes()).unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn update_with_no_changes_decodes_as_unchanged() {
    let user_id = Uuid::now_v7();
    let payload = format!(r#"{{"user_id":"{user_id}","updated_at":0}}"#);

    let decoded = wire::decode("user_updated", payload.as_bytes()).unwrap();
    match decoded {
        UserEvent::Updated(update) => {
            assert!(!update.contact_info_changed());
            assert_eq!(update.status, None);
            assert_eq!(update.email, FieldChange::Unchanged);
            assert_eq!(update.telegram, FieldChange::Unchanged);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn deleted_event_round_trips() {
    for hard in [false, true] {
        let event = UserEvent::Deleted(UserDeleted {
            user_id: Uuid::now_v7(),
            status: UserStatus::Deleted,
            deleted_at: ts(1_700_000_300),
            hard,
        });

        let payload = wire::encode(&event).unwrap();
        let decoded = wire::decode("user_deleted", payload.as_bytes()).unwrap();
        assert_eq!(decoded, event);
    }
}

#[test]
fn unknown_status_code_is_a_codec_error() {
    let user_id = Uuid::now_v7();
    let payload = format!(
        r#"{{"user_id":"{user_id}","status":7,"login":"alice","created_at":0}}"#
    );
    let err = wire::decode("user_created", payload.as_bytes()).unwrap_err();
    assert!(matches!(err, userguard::ServiceError::Codec(_)));
    assert!(!err.is_retryable());
}

#[test]
fn malformed_uuid_is_a_codec_error() {
    let payload = r#"{"user_id":"not-a-uuid","updated_at":0}"#;
    let err = wire::decode("user_updated", payload.as_bytes()).unwrap_err();
    assert!(matches!(err, userguard::ServiceError::Codec(_)));
}
