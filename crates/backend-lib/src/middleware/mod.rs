// crates/backend-lib/src/middleware/mod.rs

//! Request extractors and middleware for the Study Companion server.

pub mod auth;

pub use auth::{bearer_token, AuthUser};
