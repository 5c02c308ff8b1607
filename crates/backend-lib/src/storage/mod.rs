// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! Storage abstraction with a SQLite implementation.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use companion_common::{ChatId, MessageView, UserId};
use thiserror::Error;

pub mod pool;
pub mod sqlite;

pub use pool::DatabasePool;
pub use sqlite::SqliteStorage;

/// Storage-layer failures
#[derive(Error, Debug)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back to a domain value
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// PHC-format password digest, never the plaintext
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Durable username → password hash mapping
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user. Fails with `Conflict` when the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str)
        -> Result<UserId, StorageError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, StorageError>;
}

/// Chat → owner mapping. Ownership is fixed when the chat is created.
#[async_trait]
pub trait OwnershipRegistry: Send + Sync {
    async fn create_chat(&self, owner: UserId) -> Result<ChatId, StorageError>;

    /// `false` both for chats that do not exist and chats owned by someone else
    async fn is_owned_by(&self, chat_id: ChatId, user_id: UserId) -> Result<bool, StorageError>;
}

/// Message log of each chat
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a user message and its assistant reply atomically: both rows are
    /// written or neither is.
    async fn append_exchange(
        &self,
        chat_id: ChatId,
        user_message: &str,
        assistant_reply: &str,
    ) -> Result<(), StorageError>;

    /// All messages of a chat in creation order
    async fn list_messages(&self, chat_id: ChatId) -> Result<Vec<MessageView>, StorageError>;
}

/// Everything the service needs from a backend
pub trait Storage: CredentialStore + OwnershipRegistry + MessageStore {}

impl<T> Storage for T where T: CredentialStore + OwnershipRegistry + MessageStore {}
