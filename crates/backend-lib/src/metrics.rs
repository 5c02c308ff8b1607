// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const USER_REGISTERED: &str = "auth.user.registered";
pub const LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const LOGIN_FAILED: &str = "auth.login.failed";
pub const LOGIN_THROTTLED: &str = "auth.login.throttled";
pub const TOKEN_REJECTED: &str = "auth.token.rejected";
pub const CHAT_CREATED: &str = "chat.created";
pub const CHAT_FORBIDDEN: &str = "chat.forbidden";
pub const MESSAGE_APPENDED: &str = "chat.message.appended";
