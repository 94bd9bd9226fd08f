//! `meta` key/value table
//!
//! Holds short configuration strings, most importantly the `API_KEY`
//! chat-platform credential the bot refuses to start without.

use crate::database::{DatabaseConnection, StoreError, StoreResult};
use crate::domain_types::ApiKey;

const API_KEY: &str = "API_KEY";

const SELECT_VALUE: &str = "SELECT value FROM meta WHERE key = ?";

const UPSERT_VALUE: &str = "INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)";

/// Store of `meta` configuration rows
#[derive(Clone)]
pub struct MetaStore {
    connection: DatabaseConnection,
}

impl MetaStore {
    /// Creates a store over an initialized persistent connection
    #[must_use]
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Reads the chat-platform credential.
    ///
    /// # Errors
    ///
    /// Fails with "API key must be present" unless exactly one non-empty
    /// `API_KEY` row exists.
    pub async fn query_api_key(&self) -> StoreResult<ApiKey> {
        self.connection
            .safe_operation(|conn| {
                Box::pin(async move {
                    let value: Option<String> = sqlx::query_scalar(SELECT_VALUE)
                        .bind(API_KEY)
                        .fetch_optional(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    value
                        .and_then(|v| ApiKey::try_new(v).ok())
                        .ok_or_else(|| StoreError::constraint("API key must be present"))
                })
            })
            .await
    }

    /// Provisions or replaces the chat-platform credential.
    ///
    /// # Errors
    ///
    /// Fails when the driver rejects the write.
    pub async fn set_api_key(&self, key: &ApiKey) -> StoreResult<()> {
        let value = key.reveal();
        self.connection
            .safe_operation(move |conn| {
                Box::pin(async move {
                    sqlx::query(UPSERT_VALUE)
                        .bind(API_KEY)
                        .bind(value)
                        .execute(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    Ok(())
                })
            })
            .await
    }
}
