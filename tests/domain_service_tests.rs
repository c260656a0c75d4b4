/// Domain invariant tests
///
/// Uniqueness enforcement, default status, no-op detection and the
/// one-event-per-mutation guarantee, exercised through the facade.
/// Run with: cargo test --test domain_service_tests

use std::sync::Arc;

use tokio_test::assert_ok;
use userguard::{
    LockingExecutor, MemoryLockManager, MemoryStore, ServiceConfig, ServiceError, UserFacade,
    UserInput, UserStatus, domain::event::UserEvent, domain::FieldChange, wire,
};

fn setup() -> (Arc<MemoryStore>, UserFacade<MemoryStore>) {
    let config = ServiceConfig::default();
    let store = Arc::new(MemoryStore::new());
    let locks = Arc::new(MemoryLockManager::new());
    let executor = LockingExecutor::new(Arc::clone(&store), locks, config.lock.clone());
    (store, UserFacade::new(executor))
}

fn create(login: &str) -> UserInput {
    UserInput {
        user_id: None,
        login: login.to_string(),
        email: None,
        telegram: None,
    }
}

#[tokio::test]
async fn created_user_is_blocked_and_emits_one_event() {
    let (store, facade) = setup();

    let user_id = facade.store_user(create("alice")).await.unwrap();
    let user = facade.find_user(user_id).await.unwrap();
    assert_eq!(user.status, UserStatus::Blocked);
    assert_eq!(user.login, "alice");
    assert_eq!(user.email, None);
    assert_eq!(user.telegram, None);

    let records = store.outbox_records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_type, "user_created");
}

#[tokio::test]
async fn each_attribute_change_emits_its_own_event() {
    let (store, facade) = setup();

    facade
        .store_user(UserInput {
            user_id: None,
            login: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            telegram: Some("@alice".to_string()),
        })
        .await
        .unwrap();

    let types: Vec<String> = store
        .outbox_records()
        .await
        .into_iter()
        .map(|r| r.event_type)
        .collect();
    assert_eq!(types, vec!["user_created", "user_updated", "user_updated"]);
}

#[tokio::test]
async fn duplicate_login_is_rejected() {
    let (store, facade) = setup();

    facade.store_user(create("alice")).await.unwrap();
    let err = facade.store_user(create("alice")).await.unwrap_err();
    assert!(matches!(err, ServiceError::LoginAlreadyUsed));
    assert!(err.is_conflict());

    assert_eq!(store.user_count().await, 1);
    assert_eq!(store.outbox_records().await.len(), 1);
}

#[tokio::test]
async fn same_value_update_writes_nothing_and_emits_nothing() {
    let (store, facade) = setup();

    let user_id = facade
        .store_user(UserInput {
            user_id: None,
            login: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            telegram: None,
        })
        .await
        .unwrap();
    let before_row = store.committed_user(user_id).await.unwrap();
    let before_outbox = store.outbox_records().await.len();

    facade
        .store_user(UserInput {
            user_id: Some(user_id),
            login: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            telegram: None,
        })
        .await
        .unwrap();

    assert_eq!(store.committed_user(user_id).await.unwrap(), before_row);
    assert_eq!(store.outbox_records().await.len(), before_outbox);
}

#[tokio::test]
async fn email_conflict_leaves_both_users_unchanged() {
    let (store, facade) = setup();

    let alice = facade
        .store_user(UserInput {
            user_id: None,
            login: "alice".to_string(),
            email: Some("shared@example.com".to_string()),
            telegram: None,
        })
        .await
        .unwrap();
    let bob = facade.store_user(create("bob")).await.unwrap();
    let before_outbox = store.outbox_records().await.len();

    let err = facade
        .store_user(UserInput {
            user_id: Some(bob),
            login: "bob".to_string(),
            email: Some("shared@example.com".to_string()),
            telegram: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::EmailAlreadyUsed));

    let alice_row = store.committed_user(alice).await.unwrap();
    assert_eq!(alice_row.email.as_deref(), Some("shared@example.com"));
    let bob_row = store.committed_user(bob).await.unwrap();
    assert_eq!(bob_row.email, None);
    assert_eq!(store.outbox_records().await.len(), before_outbox);
}

#[tokio::test]
async fn clearing_email_emits_a_removed_change() {
    let (store, facade) = setup();

    let user_id = facade
        .store_user(UserInput {
            user_id: None,
            login: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            telegram: None,
        })
        .await
        .unwrap();

    facade
        .store_user(UserInput {
            user_id: Some(user_id),
            login: "alice".to_string(),
            email: None,
            telegram: None,
        })
        .await
        .unwrap();

    let records = store.outbox_records().await;
    let last = records.last().unwrap();
    assert_eq!(last.event_type, "user_updated");
    let event = wire::decode(&last.event_type, last.payload.as_bytes()).unwrap();
    match event {
        UserEvent::Updated(update) => {
            assert_eq!(update.email, FieldChange::Cleared);
            assert_eq!(update.telegram, FieldChange::Unchanged);
            assert_eq!(update.status, None);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn soft_delete_keeps_the_row_marked() {
    let (store, facade) = setup();

    let user_id = facade.store_user(create("alice")).await.unwrap();
    facade.delete_user(user_id, false).await.unwrap();

    let row = store.committed_user(user_id).await.unwrap();
    assert_eq!(row.status, UserStatus::Deleted);
    assert!(row.deleted_at.is_some());

    let records = store.outbox_records().await;
    assert_eq!(records.last().unwrap().event_type, "user_deleted");
}

#[tokio::test]
async fn hard_delete_frees_identifiers_for_reuse() {
    let (store, facade) = setup();

    let user_id = facade
        .store_user(UserInput {
            user_id: None,
            login: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            telegram: None,
        })
        .await
        .unwrap();
    facade.delete_user(user_id, true).await.unwrap();
    assert!(store.committed_user(user_id).await.is_none());

    // Both the login and the email are available again.
    let reborn = tokio_test::assert_ok!(
        facade
            .store_user(UserInput {
                user_id: None,
                login: "alice".to_string(),
                email: Some("alice@example.com".to_string()),
                telegram: None,
            })
            .await
    );
    assert_ne!(reborn, user_id);
}

#[tokio::test]
async fn operations_on_missing_users_report_not_found() {
    let (_store, facade) = setup();
    let ghost = uuid::Uuid::now_v7();

    assert!(matches!(
        facade.find_user(ghost).await.unwrap_err(),
        ServiceError::NotFound
    ));
    assert!(matches!(
        facade.delete_user(ghost, false).await.unwrap_err(),
        ServiceError::NotFound
    ));
    assert!(matches!(
        facade.set_user_status(ghost, UserStatus::Active).await.unwrap_err(),
        ServiceError::NotFound
    ));
}
