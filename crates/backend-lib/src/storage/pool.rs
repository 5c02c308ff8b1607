// ============================
// crates/backend-lib/src/storage/pool.rs
// ============================
//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time, so writes go through a
//! single-connection pool while reads share a small read-only pool.
//! Connections are checked out per query or transaction and returned to the
//! pool when dropped, on every exit path.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use super::StorageError;
use crate::config::StorageSettings;

#[derive(Clone)]
pub struct DatabasePool {
    /// Read-only pool for SELECT queries
    pub reader: SqlitePool,
    /// Single-connection pool for INSERT/DELETE and transactions
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open both pools and run pending migrations on the writer.
    /// Every connection enforces foreign keys.
    pub async fn connect(database_url: &str, max_readers: u32) -> Result<Self, StorageError> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts)
            .await?;

        // Schema must exist before read-only connections open the file
        sqlx::migrate!("./migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(max_readers.max(1))
            .connect_with(read_opts)
            .await?;

        tracing::info!(url = %database_url, max_readers, "database ready");
        Ok(Self { reader, writer })
    }

    pub async fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        Self::connect(&settings.database_url, settings.max_read_connections).await
    }

    /// Close both pools, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}
