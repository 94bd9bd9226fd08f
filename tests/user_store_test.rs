//! Persistent user store tests
//!
//! Covers the precondition-checked CRUD contract: insert/lookup round
//! trips, duplicate and missing-row rejections, default-user protection,
//! and the boundary behaviors of usernames and ids.

mod common;

use common::{persistent_connection, user};
use std::sync::Arc;
use stickfix::database::DEFAULT_USERNAME;
use stickfix::domain_types::{ApiKey, ChatId, Username};
use stickfix::storage::{MetaStore, UserStore};
use stickfix::time_provider::RealTimeProvider;
use stickfix::{StoreError, UserState};

async fn store() -> UserStore {
    UserStore::new(persistent_connection().await, Arc::new(RealTimeProvider::new()))
}

#[tokio::test]
async fn test_should_return_idle_user_when_adding_then_getting() {
    let store = store().await;
    let alice = user(42, "alice");

    let added = store.add_user(&alice).await.unwrap();
    let fetched = store.get_user(alice.chat_id).await.unwrap();

    assert_eq!(added.chat_id, fetched.chat_id);
    assert_eq!(added.username, fetched.username);
    assert_eq!(added.state, fetched.state);
    assert_eq!(fetched.chat_id, alice.chat_id);
    assert_eq!(fetched.username, alice.username);
    assert_eq!(fetched.state, UserState::Idle);
    assert!(!fetched.private_mode);
    assert!(!fetched.shuffle);
}

#[tokio::test]
async fn test_should_fail_with_constraint_when_adding_twice() {
    let store = store().await;
    let alice = user(42, "alice");

    store.add_user(&alice).await.unwrap();
    let second = store.add_user(&alice).await;

    assert_eq!(
        second.unwrap_err(),
        StoreError::Constraint {
            message: "user must not exist".to_string()
        }
    );
    // The store is unchanged.
    assert_eq!(store.get_user(alice.chat_id).await.unwrap().state, UserState::Idle);
}

#[tokio::test]
async fn test_should_fail_when_getting_absent_user() {
    let store = store().await;
    let result = store.get_user(ChatId::new(9000)).await;
    assert_eq!(
        result.unwrap_err(),
        StoreError::Constraint {
            message: "user must exist".to_string()
        }
    );
}

#[tokio::test]
async fn test_should_persist_every_state_tag_when_setting_state() {
    let store = store().await;
    let alice = user(42, "alice");
    store.add_user(&alice).await.unwrap();

    for state in UserState::ALL {
        let set = store.set_user_state(alice.chat_id, state).await.unwrap();
        assert_eq!(set, state);
        assert_eq!(store.get_user(alice.chat_id).await.unwrap().state, state);
    }
}

#[tokio::test]
async fn test_should_reflect_mode_bits_when_toggling_modes() {
    let store = store().await;
    let alice = user(42, "alice");
    store.add_user(&alice).await.unwrap();

    store.set_private_mode(alice.chat_id, true).await.unwrap();
    assert!(store.get_user(alice.chat_id).await.unwrap().private_mode);

    store.set_shuffle_mode(alice.chat_id, true).await.unwrap();
    let record = store.get_user(alice.chat_id).await.unwrap();
    assert!(record.private_mode);
    assert!(record.shuffle);

    store.set_private_mode(alice.chat_id, false).await.unwrap();
    let record = store.get_user(alice.chat_id).await.unwrap();
    assert!(!record.private_mode);
    assert!(record.shuffle);
}

#[tokio::test]
async fn test_should_protect_default_user_when_mutating() {
    let store = store().await;
    let default_id = ChatId::default_user();
    let before = store.get_user(default_id).await.unwrap();
    assert_eq!(before.username.clone().into_inner(), DEFAULT_USERNAME);
    assert_eq!(before.state, UserState::Idle);

    assert!(store.set_private_mode(default_id, true).await.is_err());
    assert!(store.set_shuffle_mode(default_id, true).await.is_err());
    assert!(
        store
            .set_user_state(default_id, UserState::Revoke)
            .await
            .is_err()
    );
    assert!(store.delete_user(default_id).await.is_err());

    // The row is unchanged after every rejected mutation.
    assert_eq!(store.get_user(default_id).await.unwrap(), before);
}

#[tokio::test]
async fn test_should_fail_get_with_constraint_when_user_deleted() {
    let store = store().await;
    let alice = user(42, "alice");
    store.add_user(&alice).await.unwrap();

    let deleted = store.delete_user(alice.chat_id).await.unwrap();
    assert_eq!(deleted.chat_id, alice.chat_id);

    assert!(matches!(
        store.get_user(alice.chat_id).await,
        Err(StoreError::Constraint { .. })
    ));
    assert!(matches!(
        store.delete_user(alice.chat_id).await,
        Err(StoreError::Constraint { .. })
    ));
}

#[tokio::test]
async fn test_should_preserve_empty_username_when_round_tripping() {
    let store = store().await;
    let anonymous = user(7, "");

    store.add_user(&anonymous).await.unwrap();
    let record = store.get_user(anonymous.chat_id).await.unwrap();

    assert_eq!(record.username, Username::empty());
}

#[tokio::test]
async fn test_should_round_trip_username_at_column_width() {
    let store = store().await;
    let name = "n".repeat(50);
    let bob = user(8, &name);

    store.add_user(&bob).await.unwrap();
    let record = store.get_user(bob.chat_id).await.unwrap();

    assert_eq!(record.username.clone().into_inner(), name);
}

#[tokio::test]
async fn test_should_behave_identically_across_id_range() {
    let store = store().await;
    for id in [i64::MIN, -1, 1, i64::MAX] {
        let u = user(id, "edge");
        store.add_user(&u).await.unwrap();
        assert_eq!(store.get_user(u.chat_id).await.unwrap().chat_id, u.chat_id);
        store
            .set_user_state(u.chat_id, UserState::PrivateMode)
            .await
            .unwrap();
        store.delete_user(u.chat_id).await.unwrap();
        assert!(store.get_user(u.chat_id).await.is_err());
    }
}

#[tokio::test]
async fn test_should_surface_fatal_error_when_state_tag_is_unknown() {
    let connection = persistent_connection().await;
    let store = UserStore::new(connection.clone(), Arc::new(RealTimeProvider::new()));
    let alice = user(42, "alice");
    store.add_user(&alice).await.unwrap();

    sqlx::query("UPDATE users SET state = 'Meditating' WHERE chat_id = 42")
        .execute(connection.pool())
        .await
        .unwrap();

    let error = store.get_user(alice.chat_id).await.unwrap_err();
    assert_eq!(
        error,
        StoreError::StateResolution {
            name: "Meditating".to_string()
        }
    );
    assert!(error.is_fatal());
}

#[tokio::test]
async fn test_should_resolve_state_case_insensitively_when_loading() {
    let connection = persistent_connection().await;
    let store = UserStore::new(connection.clone(), Arc::new(RealTimeProvider::new()));
    let alice = user(42, "alice");
    store.add_user(&alice).await.unwrap();

    sqlx::query("UPDATE users SET state = 'pRiVaTeMoDe' WHERE chat_id = 42")
        .execute(connection.pool())
        .await
        .unwrap();

    let record = store.get_user(alice.chat_id).await.unwrap();
    assert_eq!(record.state, UserState::PrivateMode);
}

#[tokio::test]
async fn test_should_fail_api_key_query_when_meta_is_empty() {
    let meta = MetaStore::new(persistent_connection().await);
    assert_eq!(
        meta.query_api_key().await.unwrap_err(),
        StoreError::Constraint {
            message: "API key must be present".to_string()
        }
    );
}

#[tokio::test]
async fn test_should_return_api_key_when_provisioned() {
    let meta = MetaStore::new(persistent_connection().await);
    let key = ApiKey::try_new("123456:token".to_string()).unwrap();

    meta.set_api_key(&key).await.unwrap();
    assert_eq!(meta.query_api_key().await.unwrap(), key);

    // Provisioning again replaces the credential.
    let rotated = ApiKey::try_new("123456:rotated".to_string()).unwrap();
    meta.set_api_key(&rotated).await.unwrap();
    assert_eq!(meta.query_api_key().await.unwrap(), rotated);
}
