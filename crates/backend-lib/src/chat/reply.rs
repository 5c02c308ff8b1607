// ============================
// crates/backend-lib/src/chat/reply.rs
// ============================
//! Assistant reply generation.
use async_trait::async_trait;

use crate::error::AppError;

/// Produces the assistant's answer to a user message
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String, AppError>;
}

/// Placeholder generator that echoes the user's message back
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoReply;

#[async_trait]
impl ReplyGenerator for EchoReply {
    async fn reply(&self, message: &str) -> Result<String, AppError> {
        Ok(format!("You said: {message}"))
    }
}
