//! Database module for embedded SQLite storage
//!
//! This module owns the connection to the relational store: configuration,
//! pool creation, schema creation, seeding of the default/public user, and
//! the transactional safe-operation wrapper every store operation routes
//! through.
//!
//! ## Architecture
//!
//! - **Functional Core**: configuration validation, connect-option and SQL
//!   generation
//! - **Imperative Shell**: pool creation, pragma application, schema I/O

use crate::domain_types::{ChatId, ConnectionPoolSize};
use chrono::Utc;
use futures::future::BoxFuture;
use nutype::nutype;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteConnection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Username of the synthetic default/public user seeded on initialization.
pub const DEFAULT_USERNAME: &str = "STICKFIX_PUBLIC";

/// Fatal errors raised while opening the database or creating its schema
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Invalid database configuration
    #[error("configuration error: {field} - {reason}")]
    Configuration {
        /// Name of the configuration field that was invalid
        field: String,
        /// Reason why the configuration was invalid
        reason: String,
    },

    /// The database could not be opened
    #[error("failed to open database: {message}")]
    Connection {
        /// Error message from the driver
        message: String,
    },

    /// A table could not be created
    #[error("failed to create schema: {message}")]
    TableCreation {
        /// Error message from the driver
        message: String,
    },

    /// The default user row could not be seeded
    #[error("failed to seed default user: {message}")]
    Seed {
        /// Error message from the driver
        message: String,
    },
}

/// Result type for schema-level operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Operation-level store failure
///
/// Every public store operation returns this sum on failure. `Constraint`
/// and `Backend` are recoverable and handled by the command layer;
/// `StateResolution` is fatal and propagates to the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A precondition on existence, uniqueness, or default-user protection
    /// failed
    #[error("constraint violation: {message}")]
    Constraint {
        /// Description of the violated precondition
        message: String,
    },

    /// The underlying SQL driver rejected the operation
    #[error("database backend error: {message}")]
    Backend {
        /// Error message from the driver
        message: String,
    },

    /// A persisted state tag could not be resolved to a known state
    #[error("cannot resolve user state name: {name}")]
    StateResolution {
        /// The unrecognized tag name
        name: String,
    },
}

impl StoreError {
    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
        }
    }

    pub(crate) fn backend(error: sqlx::Error) -> Self {
        Self::Backend {
            message: error.to_string(),
        }
    }

    /// Checks whether this failure must abort the caller instead of being
    /// reported as an operation failure.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StateResolution { .. })
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[nutype(
    sanitize(with = |path: PathBuf| path),
    validate(predicate = |path| !path.as_os_str().is_empty() && path.extension().is_some_and(|ext| ext == "db")),
    derive(Clone, Debug, Eq, PartialEq)
)]
pub struct DatabasePath(PathBuf);

impl DatabasePath {
    /// Create a new database path with validation
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty or has an invalid extension
    pub fn new<P: AsRef<Path>>(path: P) -> SchemaResult<Self> {
        let path_buf = path.as_ref().to_path_buf();
        Self::try_new(path_buf).map_err(|_| SchemaError::Configuration {
            field: "database_path".to_string(),
            reason: "Path is empty or has invalid extension (must be .db)".to_string(),
        })
    }

    /// Get the path as `PathBuf`
    #[must_use]
    pub fn as_path(&self) -> PathBuf {
        self.clone().into_inner()
    }
}

impl std::fmt::Display for DatabasePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_path().display())
    }
}

/// Where the store lives: a file in production, process memory for tests
/// and for the ephemeral store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// File-backed SQLite database
    File(DatabasePath),
    /// In-memory SQLite database, private to one pool
    InMemory,
}

impl DatabaseLocation {
    /// Checks whether the location is in-memory
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        matches!(self, Self::InMemory)
    }
}

/// Database configuration with connection pool settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    location: DatabaseLocation,
    pool_size: ConnectionPoolSize,
    enable_wal_mode: bool,
    enable_foreign_keys: bool,
}

impl DatabaseConfig {
    /// Create new database config with default settings
    #[must_use]
    pub fn new(path: DatabasePath) -> Self {
        Self {
            location: DatabaseLocation::File(path),
            pool_size: ConnectionPoolSize::default(),
            enable_wal_mode: true,
            enable_foreign_keys: true,
        }
    }

    /// Create an in-memory config
    ///
    /// In-memory SQLite databases are private to a single connection, so the
    /// pool is pinned to one connection that is never recycled.
    ///
    /// # Panics
    ///
    /// Panics if pool size 1 is not valid, which should never happen.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            location: DatabaseLocation::InMemory,
            pool_size: ConnectionPoolSize::try_new(1)
                .expect("Pool size 1 should be valid (range: 1-100)"),
            enable_wal_mode: false,
            enable_foreign_keys: false,
        }
    }

    /// Create config for testing with minimal settings
    #[must_use]
    pub fn for_testing() -> Self {
        Self::in_memory()
    }

    /// Builder pattern: set connection pool size
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: ConnectionPoolSize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Builder pattern: enable/disable WAL mode
    #[must_use]
    pub fn with_wal_mode(mut self, enable: bool) -> Self {
        self.enable_wal_mode = enable;
        self
    }

    /// Builder pattern: enable/disable foreign keys
    #[must_use]
    pub fn with_foreign_keys(mut self, enable: bool) -> Self {
        self.enable_foreign_keys = enable;
        self
    }

    /// Get the database location
    #[must_use]
    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// Get the connection pool size
    #[must_use]
    pub fn pool_size(&self) -> ConnectionPoolSize {
        self.pool_size
    }

    /// Check if WAL mode is enabled
    #[must_use]
    pub fn wal_mode_enabled(&self) -> bool {
        self.enable_wal_mode
    }

    /// Check if foreign keys are enabled
    #[must_use]
    pub fn foreign_keys_enabled(&self) -> bool {
        self.enable_foreign_keys
    }

    /// Validate configuration (functional core)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn validate(&self) -> SchemaResult<()> {
        if self.location.is_in_memory() && self.pool_size.as_u32() != 1 {
            return Err(SchemaError::Configuration {
                field: "pool_size".to_string(),
                reason: "In-memory databases require a single-connection pool".to_string(),
            });
        }
        Ok(())
    }
}

/// Pure SQL for the three tables and the default-user seed
mod schema {
    pub(super) const CREATE_META_TABLE: &str = "CREATE TABLE IF NOT EXISTS meta (
            key VARCHAR(50) PRIMARY KEY,
            value VARCHAR(50) NOT NULL
        )";

    pub(super) const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
            chat_id BIGINT PRIMARY KEY UNIQUE,
            username VARCHAR(50) NOT NULL,
            state VARCHAR(50) NOT NULL,
            is_admin BOOLEAN NOT NULL DEFAULT FALSE,
            private_mode BOOLEAN NOT NULL DEFAULT FALSE,
            shuffle BOOLEAN NOT NULL DEFAULT FALSE,
            created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )";

    pub(super) const CREATE_STICKERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS stickers (
            tag VARCHAR(50) PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(chat_id),
            sticker_id VARCHAR(50) NOT NULL
        )";

    pub(super) const SEED_DEFAULT_USER: &str = "INSERT OR IGNORE INTO users \
         (chat_id, username, state, is_admin, private_mode, shuffle, created) \
         VALUES (?, ?, 'Idle', FALSE, FALSE, FALSE, ?)";
}

/// Database connection with managed pool
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: Pool<Sqlite>,
    config: DatabaseConfig,
}

// Functional Core: pure configuration mapping
impl DatabaseConnection {
    /// Generate `SQLite` options from config (pure function)
    fn create_connect_options(config: &DatabaseConfig) -> SqliteConnectOptions {
        let mut options = match config.location() {
            DatabaseLocation::File(path) => SqliteConnectOptions::new()
                .filename(path.as_path())
                .create_if_missing(true),
            DatabaseLocation::InMemory => SqliteConnectOptions::new().in_memory(true),
        };

        if config.wal_mode_enabled() {
            options = options.pragma("journal_mode", "WAL");
        }

        if config.foreign_keys_enabled() {
            options = options.pragma("foreign_keys", "ON");
        }

        options
    }
}

// Imperative Shell: I/O operations
impl DatabaseConnection {
    /// Initialize the persistent store: open the pool, create the `users`,
    /// `meta` and `stickers` tables if absent, and seed the default user if
    /// absent. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the database cannot be opened or the
    /// schema cannot be created.
    pub async fn initialize(config: DatabaseConfig) -> SchemaResult<Self> {
        let connection = Self::open(config).await?;
        connection
            .create_tables(&[
                schema::CREATE_META_TABLE,
                schema::CREATE_USERS_TABLE,
                schema::CREATE_STICKERS_TABLE,
            ])
            .await?;
        connection.seed_default_user().await?;
        info!("persistent store initialized");
        Ok(connection)
    }

    /// Initialize an ephemeral store: the `users` table only, in memory,
    /// with no default-user seed.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if the configuration is not in-memory or
    /// the table cannot be created.
    pub async fn initialize_ephemeral(config: DatabaseConfig) -> SchemaResult<Self> {
        if !config.location().is_in_memory() {
            return Err(SchemaError::Configuration {
                field: "location".to_string(),
                reason: "The ephemeral store is always in-memory".to_string(),
            });
        }
        let connection = Self::open(config).await?;
        connection
            .create_tables(&[schema::CREATE_USERS_TABLE])
            .await?;
        Ok(connection)
    }

    async fn open(config: DatabaseConfig) -> SchemaResult<Self> {
        config.validate()?;

        let options = Self::create_connect_options(&config);
        let mut pool_options =
            SqlitePoolOptions::new().max_connections(config.pool_size().as_u32());

        // An in-memory database lives and dies with its connection; never
        // let the pool recycle it.
        if config.location().is_in_memory() {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| SchemaError::Connection {
                message: format!("Failed to create connection pool: {e}"),
            })?;

        Ok(Self { pool, config })
    }

    async fn create_tables(&self, statements: &[&str]) -> SchemaResult<()> {
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| SchemaError::TableCreation {
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    async fn seed_default_user(&self) -> SchemaResult<()> {
        sqlx::query(schema::SEED_DEFAULT_USER)
            .bind(ChatId::DEFAULT_USER)
            .bind(DEFAULT_USERNAME)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| SchemaError::Seed {
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Get the configuration this connection was opened with
    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get the underlying pool
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run a store operation inside a transaction (safe-operation wrapper).
    ///
    /// The body runs against the transaction connection; precondition checks
    /// and the write therefore cannot race. On `Ok` the transaction commits,
    /// on `Err` it rolls back and the store is unchanged. Driver errors from
    /// begin/commit become [`StoreError::Backend`]; everything else is
    /// whatever the body returned.
    pub(crate) async fn safe_operation<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, StoreResult<T>> + Send,
    {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;
        match op(&mut *tx).await {
            Ok(value) => {
                tx.commit().await.map_err(StoreError::backend)?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "transaction rollback failed");
                }
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_should_create_valid_database_path_when_given_db_extension() {
        let path = DatabasePath::new("stickfix.db").unwrap();
        assert_eq!(path.to_string(), "stickfix.db");
    }

    #[test]
    fn test_should_reject_empty_path_when_creating_database_path() {
        let result = DatabasePath::new("");
        assert!(result.is_err());
        match result.unwrap_err() {
            SchemaError::Configuration { field, reason } => {
                assert_eq!(field, "database_path");
                assert!(reason.contains("empty"));
            }
            other => panic!("Expected Configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_should_reject_invalid_extension_when_creating_database_path() {
        assert!(DatabasePath::new("stickfix.txt").is_err());
    }

    #[test]
    fn test_should_pin_pool_to_single_connection_when_in_memory() {
        let config = DatabaseConfig::in_memory();
        assert!(config.location().is_in_memory());
        assert_eq!(config.pool_size().as_u32(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_reject_oversized_pool_when_in_memory() {
        let config = DatabaseConfig::in_memory()
            .with_pool_size(ConnectionPoolSize::try_new(4).unwrap());
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_should_initialize_idempotently_when_called_twice() {
        let temp_dir = tempdir().unwrap();
        let path = DatabasePath::new(temp_dir.path().join("init.db")).unwrap();

        let first = DatabaseConnection::initialize(DatabaseConfig::new(path.clone())).await;
        assert!(first.is_ok());
        let second = DatabaseConnection::initialize(DatabaseConfig::new(path)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_should_reject_file_location_when_initializing_ephemeral() {
        let temp_dir = tempdir().unwrap();
        let path = DatabasePath::new(temp_dir.path().join("eph.db")).unwrap();

        let result = DatabaseConnection::initialize_ephemeral(DatabaseConfig::new(path)).await;
        assert!(matches!(
            result,
            Err(SchemaError::Configuration { field, .. }) if field == "location"
        ));
    }
}
