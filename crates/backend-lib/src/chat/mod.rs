// ============================
// crates/backend-lib/src/chat/mod.rs
// ============================
//! Chat gateway and reply generation.

pub mod gateway;
pub mod reply;

pub use gateway::ChatGateway;
pub use reply::{EchoReply, ReplyGenerator};
