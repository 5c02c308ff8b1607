// ============================
// crates/backend-lib/src/chat/gateway.rs
// ============================
//! Authorized access to chats and their messages.
//!
//! Every operation takes the already-resolved principal. Ownership of the
//! target chat is confirmed before any message is read or written; chats that
//! do not exist and chats owned by someone else are both reported as
//! `Forbidden`.
use std::sync::Arc;

use companion_common::{ChatId, HistoryResponse, SendResponse};
use metrics::counter;
use tracing::instrument;

use super::reply::ReplyGenerator;
use crate::error::AppError;
use crate::metrics::{CHAT_CREATED, CHAT_FORBIDDEN, MESSAGE_APPENDED};
use crate::storage::{MessageStore, OwnershipRegistry, User};

pub struct ChatGateway {
    registry: Arc<dyn OwnershipRegistry>,
    messages: Arc<dyn MessageStore>,
    replies: Arc<dyn ReplyGenerator>,
}

impl ChatGateway {
    pub fn new(
        registry: Arc<dyn OwnershipRegistry>,
        messages: Arc<dyn MessageStore>,
        replies: Arc<dyn ReplyGenerator>,
    ) -> Self {
        Self {
            registry,
            messages,
            replies,
        }
    }

    /// Send a message and store it with the generated reply.
    /// Without a `chat_id` a new chat owned by `principal` is created.
    #[instrument(skip(self, principal, message), fields(user_id = %principal.id))]
    pub async fn send(
        &self,
        principal: &User,
        message: &str,
        chat_id: Option<ChatId>,
    ) -> Result<SendResponse, AppError> {
        if let Some(chat_id) = chat_id {
            self.authorize(principal, chat_id).await?;
        }

        // Generated before a chat is minted so a failing generator leaves no empty chat
        let reply = self.replies.reply(message).await?;

        let chat_id = match chat_id {
            Some(chat_id) => chat_id,
            None => {
                let chat_id = self.registry.create_chat(principal.id).await?;
                counter!(CHAT_CREATED).increment(1);
                tracing::debug!(%chat_id, "chat created");
                chat_id
            },
        };

        self.messages
            .append_exchange(chat_id, message, &reply)
            .await?;
        counter!(MESSAGE_APPENDED).increment(2);

        Ok(SendResponse { chat_id, reply })
    }

    /// Full message history of a chat owned by `principal`
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn history(
        &self,
        principal: &User,
        chat_id: ChatId,
    ) -> Result<HistoryResponse, AppError> {
        self.authorize(principal, chat_id).await?;

        let messages = self.messages.list_messages(chat_id).await?;
        Ok(HistoryResponse { chat_id, messages })
    }

    async fn authorize(&self, principal: &User, chat_id: ChatId) -> Result<(), AppError> {
        if self.registry.is_owned_by(chat_id, principal.id).await? {
            Ok(())
        } else {
            counter!(CHAT_FORBIDDEN).increment(1);
            tracing::info!(%chat_id, user_id = %principal.id, "chat access denied");
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::EchoReply;
    use crate::storage::{CredentialStore, DatabasePool, SqliteStorage};
    use async_trait::async_trait;
    use companion_common::Role;

    struct BrokenReply;

    #[async_trait]
    impl ReplyGenerator for BrokenReply {
        async fn reply(&self, _message: &str) -> Result<String, AppError> {
            Err(AppError::Internal("generator offline".to_string()))
        }
    }

    async fn setup(
        replies: Arc<dyn ReplyGenerator>,
    ) -> (ChatGateway, SqliteStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("chat.db").display());
        let storage = SqliteStorage::new(DatabasePool::connect(&url, 2).await.unwrap());
        let shared = Arc::new(storage.clone());
        (ChatGateway::new(shared.clone(), shared, replies), storage, dir)
    }

    async fn user(storage: &SqliteStorage, name: &str) -> User {
        let id = storage.create_user(name, "hash").await.unwrap();
        storage.find_by_id(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_first_send_creates_owned_chat() {
        let (gateway, storage, _dir) = setup(Arc::new(EchoReply)).await;
        let alice = user(&storage, "alice").await;

        let sent = gateway.send(&alice, "hello", None).await.unwrap();
        assert_eq!(sent.reply, "You said: hello");

        let again = gateway.send(&alice, "world", Some(sent.chat_id)).await.unwrap();
        assert_eq!(again.chat_id, sent.chat_id);

        let history = gateway.history(&alice, sent.chat_id).await.unwrap();
        let roles: Vec<Role> = history.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn test_each_send_without_chat_id_starts_a_new_chat() {
        let (gateway, storage, _dir) = setup(Arc::new(EchoReply)).await;
        let alice = user(&storage, "alice").await;

        let first = gateway.send(&alice, "one", None).await.unwrap();
        let second = gateway.send(&alice, "two", None).await.unwrap();
        assert_ne!(first.chat_id, second.chat_id);
    }

    #[tokio::test]
    async fn test_foreign_chat_is_forbidden() {
        let (gateway, storage, _dir) = setup(Arc::new(EchoReply)).await;
        let alice = user(&storage, "alice").await;
        let bob = user(&storage, "bob").await;

        let chat = gateway.send(&alice, "private", None).await.unwrap().chat_id;

        assert!(matches!(
            gateway.send(&bob, "intrusion", Some(chat)).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            gateway.history(&bob, chat).await,
            Err(AppError::Forbidden)
        ));

        // Bob's attempt wrote nothing
        assert_eq!(gateway.history(&alice, chat).await.unwrap().messages.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_chat_looks_like_foreign_chat() {
        let (gateway, storage, _dir) = setup(Arc::new(EchoReply)).await;
        let alice = user(&storage, "alice").await;

        assert!(matches!(
            gateway.history(&alice, ChatId(9999)).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            gateway.send(&alice, "hi", Some(ChatId(9999))).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_failed_reply_persists_nothing() {
        let (gateway, storage, _dir) = setup(Arc::new(BrokenReply)).await;
        let alice = user(&storage, "alice").await;

        assert!(gateway.send(&alice, "hello", None).await.is_err());

        let chats: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chats")
            .fetch_one(&storage.pool().reader)
            .await
            .unwrap();
        let messages: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&storage.pool().reader)
            .await
            .unwrap();
        assert_eq!(chats.0, 0);
        assert_eq!(messages.0, 0);
    }
}
