// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! This module defines the `AuthService` trait, which is used for registration and login
use async_trait::async_trait;
use companion_common::{AuthResponse, Credentials};

use crate::error::AppError;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account and return a token for it.
    /// Fails with `Conflict` when the username is taken.
    async fn register(&self, credentials: Credentials) -> Result<AuthResponse, AppError>;

    /// Check credentials and return a fresh token.
    /// Unknown usernames and wrong passwords fail identically with `Unauthenticated`.
    async fn login(&self, credentials: Credentials) -> Result<AuthResponse, AppError>;
}
