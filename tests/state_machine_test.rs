//! State machine integration tests
//!
//! Drives the user entity's transition methods against real in-memory
//! stores and asserts both the returned transition results and the store
//! side effects.

mod common;

use common::{test_context, user};
use stickfix::UserState;
use stickfix::domain::user::TransitionResult;

#[tokio::test]
async fn test_should_park_user_in_ephemeral_store_when_starting() {
    let (ctx, _transport, _clock) = test_context().await;
    let mut alice = user(42, "alice");

    let result = alice.on_start(&ctx.users, &ctx.ephemeral).await;

    assert_eq!(
        result,
        TransitionResult::Success {
            from: UserState::Idle,
            to: UserState::Start
        }
    );
    assert_eq!(alice.state, UserState::Start);
    let pending = ctx.ephemeral.get_user(alice.chat_id).await.unwrap();
    assert_eq!(pending.state, UserState::Start);
}

#[tokio::test]
async fn test_should_move_user_to_persistent_store_when_start_confirmed() {
    let (ctx, _transport, _clock) = test_context().await;
    let mut alice = user(42, "alice");
    alice.on_start(&ctx.users, &ctx.ephemeral).await;

    let result = alice.on_start_confirmation(&ctx.users, &ctx.ephemeral).await;

    assert!(result.is_success());
    assert_eq!(alice.state, UserState::Idle);
    let registered = ctx.users.get_user(alice.chat_id).await.unwrap();
    assert_eq!(registered.state, UserState::Idle);
    assert_eq!(registered.username, alice.username);
    assert!(ctx.ephemeral.get_user(alice.chat_id).await.is_err());
}

#[tokio::test]
async fn test_should_discard_pending_registration_when_start_rejected() {
    let (ctx, _transport, _clock) = test_context().await;
    let mut alice = user(42, "alice");
    alice.on_start(&ctx.users, &ctx.ephemeral).await;

    let result = alice.on_start_rejection(&ctx.users, &ctx.ephemeral).await;

    assert!(result.is_success());
    assert!(ctx.ephemeral.get_user(alice.chat_id).await.is_err());
    assert!(ctx.users.get_user(alice.chat_id).await.is_err());
}

#[tokio::test]
async fn test_should_delete_user_when_revocation_confirmed() {
    let (ctx, _transport, _clock) = test_context().await;
    let mut alice = user(42, "alice");
    ctx.users.add_user(&alice).await.unwrap();

    assert!(alice.on_revoke(&ctx.users, &ctx.ephemeral).await.is_success());
    assert_eq!(
        ctx.users.get_user(alice.chat_id).await.unwrap().state,
        UserState::Revoke
    );

    assert!(
        alice
            .on_revoke_confirmation(&ctx.users, &ctx.ephemeral)
            .await
            .is_success()
    );
    assert!(ctx.users.get_user(alice.chat_id).await.is_err());
}

#[tokio::test]
async fn test_should_keep_user_idle_when_revocation_aborted() {
    let (ctx, _transport, _clock) = test_context().await;
    let mut alice = user(42, "alice");
    ctx.users.add_user(&alice).await.unwrap();
    alice.on_revoke(&ctx.users, &ctx.ephemeral).await;

    assert!(
        alice
            .on_revoke_rejection(&ctx.users, &ctx.ephemeral)
            .await
            .is_success()
    );

    let record = ctx.users.get_user(alice.chat_id).await.unwrap();
    assert_eq!(record.state, UserState::Idle);
    assert_eq!(alice.state, UserState::Idle);
}

#[tokio::test]
async fn test_should_persist_mode_and_return_to_idle_when_private_mode_chosen() {
    let (ctx, _transport, _clock) = test_context().await;
    let mut alice = user(42, "alice");
    ctx.users.add_user(&alice).await.unwrap();

    alice.on_private_mode(&ctx.users, &ctx.ephemeral).await;
    assert_eq!(
        ctx.users.get_user(alice.chat_id).await.unwrap().state,
        UserState::PrivateMode
    );

    assert!(
        alice
            .on_private_mode_enabled(&ctx.users, &ctx.ephemeral)
            .await
            .is_success()
    );
    let record = ctx.users.get_user(alice.chat_id).await.unwrap();
    assert!(record.private_mode);
    assert_eq!(record.state, UserState::Idle);

    alice.on_private_mode(&ctx.users, &ctx.ephemeral).await;
    alice
        .on_private_mode_disabled(&ctx.users, &ctx.ephemeral)
        .await;
    assert!(!ctx.users.get_user(alice.chat_id).await.unwrap().private_mode);
}

#[tokio::test]
async fn test_should_persist_mode_and_return_to_idle_when_shuffle_chosen() {
    let (ctx, _transport, _clock) = test_context().await;
    let mut alice = user(42, "alice");
    ctx.users.add_user(&alice).await.unwrap();

    alice.on_shuffle(&ctx.users, &ctx.ephemeral).await;
    assert!(
        alice
            .on_shuffle_enabled(&ctx.users, &ctx.ephemeral)
            .await
            .is_success()
    );

    let record = ctx.users.get_user(alice.chat_id).await.unwrap();
    assert!(record.shuffle);
    assert_eq!(record.state, UserState::Idle);
}

#[tokio::test]
async fn test_should_fail_without_state_change_when_event_not_allowed() {
    let (ctx, _transport, _clock) = test_context().await;
    let mut alice = user(42, "alice");
    ctx.users.add_user(&alice).await.unwrap();
    alice.on_start(&ctx.users, &ctx.ephemeral).await;

    // A revocation event has no cell in the Start row.
    let result = alice
        .on_revoke_confirmation(&ctx.users, &ctx.ephemeral)
        .await;

    assert_eq!(
        result,
        TransitionResult::Failure {
            current: UserState::Start
        }
    );
    assert_eq!(alice.state, UserState::Start);
}

#[tokio::test]
async fn test_should_never_leave_idle_when_idle_event_fires() {
    let (ctx, _transport, _clock) = test_context().await;
    let mut alice = user(42, "alice");
    ctx.users.add_user(&alice).await.unwrap();

    let result = alice.on_idle(&ctx.users, &ctx.ephemeral).await;

    assert!(!result.is_success());
    assert_eq!(alice.state, UserState::Idle);
}

#[tokio::test]
async fn test_should_fail_without_state_change_when_store_rejects_side_effect() {
    let (ctx, _transport, _clock) = test_context().await;
    // Alice is not in the persistent store, so the revoke side effect
    // cannot be applied.
    let mut alice = user(42, "alice");

    let result = alice.on_revoke(&ctx.users, &ctx.ephemeral).await;

    assert_eq!(
        result,
        TransitionResult::Failure {
            current: UserState::Idle
        }
    );
    assert_eq!(alice.state, UserState::Idle);
}
