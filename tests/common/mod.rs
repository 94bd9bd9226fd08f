//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use stickfix::domain_types::{ChatId, EvictionThresholdSecs, Username};
use stickfix::storage::EphemeralStore;
use stickfix::time_provider::{MockTimeProvider, SharedTimeProvider};
use stickfix::transport::{
    IncomingCallback, IncomingCommand, RecordingTransport, Sender, TransportEvent,
};
use stickfix::{
    DatabaseConfig, DatabaseConnection, StickfixContext, StickfixUser,
};

/// An initialized in-memory persistent connection
pub async fn persistent_connection() -> DatabaseConnection {
    DatabaseConnection::initialize(DatabaseConfig::for_testing())
        .await
        .expect("in-memory store initializes")
}

/// A full context over in-memory stores, a recording transport, and a
/// mock clock
pub async fn test_context() -> (StickfixContext, Arc<RecordingTransport>, MockTimeProvider) {
    let mock = MockTimeProvider::new();
    let time: SharedTimeProvider = Arc::new(mock.clone());
    let connection = persistent_connection().await;
    let ephemeral = EphemeralStore::detached(time.clone(), EvictionThresholdSecs::default())
        .await
        .expect("ephemeral store initializes");
    let transport = Arc::new(RecordingTransport::new());
    let context = StickfixContext::new(connection, ephemeral, transport.clone(), time);
    (context, transport, mock)
}

/// A user value in the `Idle` state
pub fn user(id: i64, username: &str) -> StickfixUser {
    StickfixUser::new(
        ChatId::new(id),
        Username::try_new(username.to_string()).expect("test username fits the column"),
    )
}

/// An inbound command event from the given account
pub fn command_event(name: &str, id: i64, username: &str) -> TransportEvent {
    TransportEvent::Command(IncomingCommand {
        name: name.to_string(),
        sender: Some(Sender {
            id: ChatId::new(id),
            username: Some(username.to_string()),
        }),
        chat: ChatId::new(id),
        args: Vec::new(),
        replied_sticker: None,
    })
}

/// An inbound callback event from the given account
pub fn callback_event(name: &str, id: i64) -> TransportEvent {
    TransportEvent::Callback(IncomingCallback {
        name: name.to_string(),
        sender: Some(Sender {
            id: ChatId::new(id),
            username: Some("alice".to_string()),
        }),
    })
}
