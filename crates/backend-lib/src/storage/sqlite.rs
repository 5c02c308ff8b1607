// ============================
// crates/backend-lib/src/storage/sqlite.rs
// ============================
//! SQLite implementation of the storage traits.
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use companion_common::{ChatId, MessageView, Role, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{
    pool::DatabasePool, CredentialStore, MessageStore, OwnershipRegistry, StorageError, User,
};

/// SQLite-backed storage for users, chats and messages
#[derive(Clone)]
pub struct SqliteStorage {
    pool: DatabasePool,
}

impl SqliteStorage {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for maintenance queries
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Delete a user together with their chats and messages.
    /// Returns `false` if no such user existed.
    pub async fn delete_user(&self, user_id: UserId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id.0)
            .execute(&self.pool.writer)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("invalid timestamp {s:?}: {e}")))
}

fn user_from_row(row: &SqliteRow) -> Result<User, StorageError> {
    let created_at: String = row.try_get("created_at")?;
    Ok(User {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        created_at: parse_datetime(&created_at)?,
    })
}

fn message_from_row(row: &SqliteRow) -> Result<MessageView, StorageError> {
    let role: String = row.try_get("role")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(MessageView {
        role: role.parse::<Role>().map_err(StorageError::Corrupt)?,
        content: row.try_get("content")?,
        created_at: parse_datetime(&created_at)?,
    })
}

#[async_trait]
impl CredentialStore for SqliteStorage {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<UserId, StorageError> {
        // Uniqueness is left to the UNIQUE constraint; a prior lookup would race.
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(now_timestamp())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StorageError::Conflict(format!("username {username:?} already exists"))
            },
            other => StorageError::Database(other),
        })?;

        Ok(UserId(result.last_insert_rowid()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        sqlx::query("SELECT id, username, password_hash, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, StorageError> {
        sqlx::query("SELECT id, username, password_hash, created_at FROM users WHERE id = ?")
            .bind(user_id.0)
            .fetch_optional(&self.pool.reader)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }
}

#[async_trait]
impl OwnershipRegistry for SqliteStorage {
    async fn create_chat(&self, owner: UserId) -> Result<ChatId, StorageError> {
        let result = sqlx::query("INSERT INTO chats (user_id, created_at) VALUES (?, ?)")
            .bind(owner.0)
            .bind(now_timestamp())
            .execute(&self.pool.writer)
            .await?;

        Ok(ChatId(result.last_insert_rowid()))
    }

    async fn is_owned_by(&self, chat_id: ChatId, user_id: UserId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM chats WHERE id = ? AND user_id = ?")
            .bind(chat_id.0)
            .bind(user_id.0)
            .fetch_optional(&self.pool.reader)
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl MessageStore for SqliteStorage {
    async fn append_exchange(
        &self,
        chat_id: ChatId,
        user_message: &str,
        assistant_reply: &str,
    ) -> Result<(), StorageError> {
        // Dropping the transaction on any early return rolls it back.
        let mut tx = self.pool.writer.begin().await?;

        for (role, content) in [(Role::User, user_message), (Role::Assistant, assistant_reply)] {
            sqlx::query(
                "INSERT INTO messages (chat_id, role, content, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(chat_id.0)
            .bind(role.as_str())
            .bind(content)
            .bind(now_timestamp())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_messages(&self, chat_id: ChatId) -> Result<Vec<MessageView>, StorageError> {
        let rows = sqlx::query(
            "SELECT role, content, created_at FROM messages WHERE chat_id = ? ORDER BY id ASC",
        )
        .bind(chat_id.0)
        .fetch_all(&self.pool.reader)
        .await?;

        rows.iter().map(message_from_row).collect()
    }
}
