//! In-memory store of pre-confirmation registrants
//!
//! Holds the same `users` schema as the persistent store and mirrors its
//! CRUD contract, but lives in process memory and forgets rows that sit
//! unconfirmed past the eviction threshold. A background task spawned by
//! [`EphemeralStore::init`] wakes up every eviction interval and deletes
//! every row whose `created` timestamp is older than the threshold;
//! eviction failures are logged and never terminate the task.

use crate::database::{DatabaseConfig, DatabaseConnection, SchemaResult, StoreError, StoreResult};
use crate::domain::state::UserState;
use crate::domain::user::StickfixUser;
use crate::domain_types::{ChatId, EvictionIntervalSecs, EvictionThresholdSecs};
use crate::storage::{UserRecord, UserStore};
use crate::time_provider::SharedTimeProvider;
use tracing::{info, warn};

const DELETE_EXPIRED: &str = "DELETE FROM users WHERE created < ?";

/// In-memory mirror of the `users` table with TTL-based eviction
#[derive(Clone)]
pub struct EphemeralStore {
    connection: DatabaseConnection,
    users: UserStore,
    time: SharedTimeProvider,
    threshold: EvictionThresholdSecs,
}

impl EphemeralStore {
    /// Creates the store and spawns the periodic eviction task.
    ///
    /// The task runs for the process lifetime.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::database::SchemaError`] if the in-memory table
    /// cannot be created.
    pub async fn init(
        time: SharedTimeProvider,
        interval: EvictionIntervalSecs,
        threshold: EvictionThresholdSecs,
    ) -> SchemaResult<Self> {
        let store = Self::detached(time, threshold).await?;
        store.spawn_eviction_task(interval);
        Ok(store)
    }

    /// Creates the store without the background task; eviction is driven by
    /// explicit [`EphemeralStore::evict_expired`] calls.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::database::SchemaError`] if the in-memory table
    /// cannot be created.
    pub async fn detached(
        time: SharedTimeProvider,
        threshold: EvictionThresholdSecs,
    ) -> SchemaResult<Self> {
        let connection = DatabaseConnection::initialize_ephemeral(DatabaseConfig::in_memory()).await?;
        let users = UserStore::new(connection.clone(), time.clone());
        Ok(Self {
            connection,
            users,
            time,
            threshold,
        })
    }

    /// Inserts an in-flight registrant with state `Idle`.
    ///
    /// # Errors
    ///
    /// Fails with a constraint violation when a row with the same id
    /// already exists.
    pub async fn add_user(&self, user: &StickfixUser) -> StoreResult<UserRecord> {
        self.users.add_user(user).await
    }

    /// Loads an in-flight registrant.
    ///
    /// # Errors
    ///
    /// Fails with a constraint violation when no row exists.
    pub async fn get_user(&self, chat_id: ChatId) -> StoreResult<UserRecord> {
        self.users.get_user(chat_id).await
    }

    /// Updates the state tag of an in-flight registrant.
    ///
    /// # Errors
    ///
    /// Fails when the id addresses the default user or no row exists.
    pub async fn set_user_state(
        &self,
        chat_id: ChatId,
        state: UserState,
    ) -> StoreResult<UserState> {
        self.users.set_user_state(chat_id, state).await
    }

    /// Deletes an in-flight registrant, returning the row.
    ///
    /// # Errors
    ///
    /// Fails when the id addresses the default user or no row exists.
    pub async fn delete_user(&self, chat_id: ChatId) -> StoreResult<UserRecord> {
        self.users.delete_user(chat_id).await
    }

    /// Deletes every row older than the eviction threshold, returning the
    /// number of evicted rows.
    ///
    /// # Errors
    ///
    /// Fails when the driver rejects the delete.
    pub async fn evict_expired(&self) -> StoreResult<u64> {
        let age = chrono::Duration::from_std(self.threshold.as_duration())
            .expect("validated threshold fits chrono range");
        let cutoff = self.time.now() - age;
        self.connection
            .safe_operation(move |conn| {
                Box::pin(async move {
                    let result = sqlx::query(DELETE_EXPIRED)
                        .bind(cutoff)
                        .execute(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    Ok(result.rows_affected())
                })
            })
            .await
    }

    fn spawn_eviction_task(&self, interval: EvictionIntervalSecs) {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                store.time.sleep(interval.as_duration()).await;
                match store.evict_expired().await {
                    Ok(0) => {}
                    Ok(evicted) => {
                        info!(evicted, "evicted expired in-flight registrations");
                    }
                    Err(error) => warn!(%error, "ephemeral eviction failed"),
                }
            }
        });
    }
}
