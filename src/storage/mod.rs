//! Storage layer for the persistent and ephemeral user stores
//!
//! This module implements precondition-checked CRUD over the relational
//! schema. Every public operation routes through the transactional
//! safe-operation wrapper on [`DatabaseConnection`], so the existence checks
//! and the write share one transaction and cannot race.
//!
//! # Submodules
//!
//! - `user_store` - persistent `users` table CRUD
//! - `meta_store` - `meta` key/value table (the `API_KEY` credential)
//! - `sticker_store` - tagged sticker references
//! - `ephemeral` - in-memory `users` mirror with TTL-based eviction

pub mod ephemeral;
pub mod meta_store;
pub mod sticker_store;
pub mod user_store;

pub use ephemeral::EphemeralStore;
pub use meta_store::MetaStore;
pub use sticker_store::{StickerRecord, StickerStore};
pub use user_store::UserStore;

use crate::database::{StoreError, StoreResult};
use crate::domain::user::StickfixUser;
use crate::domain::state::UserState;
use crate::domain_types::{ChatId, Username};
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// One row of the `users` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Platform-assigned id, primary key
    pub chat_id: ChatId,
    /// Username at registration time, possibly empty
    pub username: Username,
    /// Current state tag
    pub state: UserState,
    /// Administrative flag; carried by the schema, never mutated here
    pub is_admin: bool,
    /// Private-visibility mode bit
    pub private_mode: bool,
    /// Shuffle-ordering mode bit
    pub shuffle: bool,
    /// Insertion timestamp
    pub created: DateTime<Utc>,
}

impl UserRecord {
    /// Maps a `users` row, validating every column
    pub(crate) fn from_row(row: &SqliteRow) -> StoreResult<Self> {
        let chat_id: i64 = row.try_get("chat_id").map_err(StoreError::backend)?;
        let username: String = row.try_get("username").map_err(StoreError::backend)?;
        let state: String = row.try_get("state").map_err(StoreError::backend)?;
        let is_admin: bool = row.try_get("is_admin").map_err(StoreError::backend)?;
        let private_mode: bool = row.try_get("private_mode").map_err(StoreError::backend)?;
        let shuffle: bool = row.try_get("shuffle").map_err(StoreError::backend)?;
        let created: DateTime<Utc> = row.try_get("created").map_err(StoreError::backend)?;

        let state = UserState::resolve(&state)?;
        let username = Username::try_new(username)
            .map_err(|_| StoreError::constraint("stored username exceeds the column width"))?;

        Ok(Self {
            chat_id: ChatId::new(chat_id),
            username,
            state,
            is_admin,
            private_mode,
            shuffle,
            created,
        })
    }

    /// Reconstructs the in-memory user entity held by handlers
    #[must_use]
    pub fn to_user(&self) -> StickfixUser {
        StickfixUser::with_state(self.chat_id, self.username.clone(), self.state)
    }
}
