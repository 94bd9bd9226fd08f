//! Persistent `users` table CRUD
//!
//! Every operation asserts its presence/absence precondition with a
//! `SELECT COUNT(*)` inside the same transaction as the mutation, and the
//! default/public user (id 0) is rejected by all mutating operations.

use crate::database::{DatabaseConnection, StoreError, StoreResult};
use crate::domain::state::UserState;
use crate::domain::user::StickfixUser;
use crate::domain_types::ChatId;
use crate::storage::UserRecord;
use crate::time_provider::SharedTimeProvider;
use sqlx::SqliteConnection;
use tracing::instrument;

const COUNT_USER: &str = "SELECT COUNT(*) FROM users WHERE chat_id = ?";

const SELECT_USER: &str = "SELECT chat_id, username, state, is_admin, private_mode, shuffle, \
     created FROM users WHERE chat_id = ?";

const INSERT_USER: &str = "INSERT INTO users \
     (chat_id, username, state, is_admin, private_mode, shuffle, created) \
     VALUES (?, ?, ?, FALSE, FALSE, FALSE, ?)";

const UPDATE_STATE: &str = "UPDATE users SET state = ? WHERE chat_id = ?";

const DELETE_USER: &str = "DELETE FROM users WHERE chat_id = ?";

const UPDATE_PRIVATE_MODE: &str = "UPDATE users SET private_mode = ? WHERE chat_id = ?";

const UPDATE_SHUFFLE: &str = "UPDATE users SET shuffle = ? WHERE chat_id = ?";

pub(crate) async fn user_exists(
    conn: &mut SqliteConnection,
    chat_id: ChatId,
) -> StoreResult<bool> {
    let count: i64 = sqlx::query_scalar(COUNT_USER)
        .bind(chat_id.as_i64())
        .fetch_one(conn)
        .await
        .map_err(StoreError::backend)?;
    Ok(count > 0)
}

pub(crate) fn reject_default_user(chat_id: ChatId) -> StoreResult<()> {
    if chat_id.is_default_user() {
        return Err(StoreError::constraint(
            "the default user cannot be modified",
        ));
    }
    Ok(())
}

/// Persistent store of registered users
#[derive(Clone)]
pub struct UserStore {
    connection: DatabaseConnection,
    time: SharedTimeProvider,
}

impl UserStore {
    /// Creates a store over an initialized persistent connection
    #[must_use]
    pub fn new(connection: DatabaseConnection, time: SharedTimeProvider) -> Self {
        Self { connection, time }
    }

    /// Loads a user row.
    ///
    /// # Errors
    ///
    /// Fails with a constraint violation when no row exists, and with a
    /// fatal state-resolution error when the persisted state tag is
    /// unknown.
    #[instrument(skip(self))]
    pub async fn get_user(&self, chat_id: ChatId) -> StoreResult<UserRecord> {
        self.connection
            .safe_operation(move |conn| {
                Box::pin(async move {
                    let row = sqlx::query(SELECT_USER)
                        .bind(chat_id.as_i64())
                        .fetch_optional(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    let row = row.ok_or_else(|| StoreError::constraint("user must exist"))?;
                    UserRecord::from_row(&row)
                })
            })
            .await
    }

    /// Inserts a new user with state `Idle` and both mode bits off.
    ///
    /// # Errors
    ///
    /// Fails with a constraint violation when a row with the same id
    /// already exists.
    #[instrument(skip(self, user), fields(chat_id = %user.chat_id))]
    pub async fn add_user(&self, user: &StickfixUser) -> StoreResult<UserRecord> {
        let chat_id = user.chat_id;
        let username = user.username.clone();
        let created = self.time.now();
        self.connection
            .safe_operation(move |conn| {
                Box::pin(async move {
                    if user_exists(&mut *conn, chat_id).await? {
                        return Err(StoreError::constraint("user must not exist"));
                    }
                    sqlx::query(INSERT_USER)
                        .bind(chat_id.as_i64())
                        .bind(username.clone().into_inner())
                        .bind(UserState::Idle.canonical_name())
                        .bind(created)
                        .execute(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    Ok(UserRecord {
                        chat_id,
                        username,
                        state: UserState::Idle,
                        is_admin: false,
                        private_mode: false,
                        shuffle: false,
                        created,
                    })
                })
            })
            .await
    }

    /// Updates the persisted state tag.
    ///
    /// # Errors
    ///
    /// Fails when the id addresses the default user or no row exists.
    pub async fn set_user_state(
        &self,
        chat_id: ChatId,
        state: UserState,
    ) -> StoreResult<UserState> {
        self.connection
            .safe_operation(move |conn| {
                Box::pin(async move {
                    reject_default_user(chat_id)?;
                    if !user_exists(&mut *conn, chat_id).await? {
                        return Err(StoreError::constraint("user must exist"));
                    }
                    sqlx::query(UPDATE_STATE)
                        .bind(state.canonical_name())
                        .bind(chat_id.as_i64())
                        .execute(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    Ok(state)
                })
            })
            .await
    }

    /// Deletes a user row, returning it.
    ///
    /// # Errors
    ///
    /// Fails when the id addresses the default user or no row exists.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, chat_id: ChatId) -> StoreResult<UserRecord> {
        self.connection
            .safe_operation(move |conn| {
                Box::pin(async move {
                    reject_default_user(chat_id)?;
                    let row = sqlx::query(SELECT_USER)
                        .bind(chat_id.as_i64())
                        .fetch_optional(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    let row = row.ok_or_else(|| StoreError::constraint("user must exist"))?;
                    let record = UserRecord::from_row(&row)?;
                    sqlx::query(DELETE_USER)
                        .bind(chat_id.as_i64())
                        .execute(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    Ok(record)
                })
            })
            .await
    }

    /// Sets the private-visibility mode bit.
    ///
    /// # Errors
    ///
    /// Fails when the id addresses the default user or no row exists.
    pub async fn set_private_mode(&self, chat_id: ChatId, enabled: bool) -> StoreResult<bool> {
        self.set_mode_column(UPDATE_PRIVATE_MODE, chat_id, enabled).await
    }

    /// Sets the shuffle-ordering mode bit.
    ///
    /// # Errors
    ///
    /// Fails when the id addresses the default user or no row exists.
    pub async fn set_shuffle_mode(&self, chat_id: ChatId, enabled: bool) -> StoreResult<bool> {
        self.set_mode_column(UPDATE_SHUFFLE, chat_id, enabled).await
    }

    async fn set_mode_column(
        &self,
        statement: &'static str,
        chat_id: ChatId,
        enabled: bool,
    ) -> StoreResult<bool> {
        self.connection
            .safe_operation(move |conn| {
                Box::pin(async move {
                    reject_default_user(chat_id)?;
                    if !user_exists(&mut *conn, chat_id).await? {
                        return Err(StoreError::constraint("user must exist"));
                    }
                    sqlx::query(statement)
                        .bind(enabled)
                        .bind(chat_id.as_i64())
                        .execute(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    Ok(enabled)
                })
            })
            .await
    }
}
