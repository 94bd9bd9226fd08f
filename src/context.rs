//! Explicit dependency bundle threaded through every handler

use crate::database::DatabaseConnection;
use crate::storage::{EphemeralStore, MetaStore, StickerStore, UserStore};
use crate::time_provider::SharedTimeProvider;
use crate::transport::ChatTransport;
use std::sync::Arc;

/// The collaborators a command or callback handler needs
///
/// Handlers receive this by reference instead of reaching into any ambient
/// scope; everything a handler touches is visible in its signature.
#[derive(Clone)]
pub struct StickfixContext {
    /// Persistent registered-user store
    pub users: UserStore,
    /// `meta` configuration store
    pub meta: MetaStore,
    /// Tagged sticker store
    pub stickers: StickerStore,
    /// In-flight registration store
    pub ephemeral: EphemeralStore,
    /// Outbound chat transport
    pub transport: Arc<dyn ChatTransport>,
}

impl StickfixContext {
    /// Assembles the context over an initialized persistent connection
    #[must_use]
    pub fn new(
        connection: DatabaseConnection,
        ephemeral: EphemeralStore,
        transport: Arc<dyn ChatTransport>,
        time: SharedTimeProvider,
    ) -> Self {
        Self {
            users: UserStore::new(connection.clone(), time),
            meta: MetaStore::new(connection.clone()),
            stickers: StickerStore::new(connection),
            ephemeral,
            transport,
        }
    }
}
