// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between Study Companion clients and the server.
//! This module defines the HTTP request/response bodies and supporting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered user
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Identifier of a chat
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a chat message
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Name used on the wire and in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown message role: {other}")),
        }
    }
}

/// Body of `POST /api/auth/register` and `POST /api/auth/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Credentials {
    /// Case-sensitive username
    pub username: String,
    /// Plaintext password, only ever held in memory
    pub password: String,
}

/// Successful registration or login
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthResponse {
    pub user_id: UserId,
    /// Bearer token for the `Authorization` header
    pub token: String,
}

/// Body of `POST /api/chat/send`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SendRequest {
    pub message: String,
    /// Continue an existing chat; a new chat is created when absent
    #[serde(default)]
    pub chat_id: Option<ChatId>,
}

/// Response to `POST /api/chat/send`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    pub chat_id: ChatId,
    pub reply: String,
}

/// Query string of `GET /api/chat/history`
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct HistoryQuery {
    pub chat_id: ChatId,
}

/// A stored message as returned by the history endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Response to `GET /api/chat/history`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryResponse {
    pub chat_id: ChatId,
    /// Messages in creation order
    pub messages: Vec<MessageView>,
}
