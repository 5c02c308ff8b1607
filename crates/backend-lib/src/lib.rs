// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the Study Companion chat service.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthRateLimiter, AuthService, DefaultAuth, ScryptHasher, SessionResolver, TokenService};
use crate::chat::{ChatGateway, EchoReply, ReplyGenerator};
use crate::config::Settings;
use crate::error::AppError;
use crate::storage::Storage;

/// Application state shared across all handlers
pub struct AppState {
    /// Registration and login
    pub auth: Arc<dyn AuthService>,
    /// Bearer token resolution
    pub sessions: Arc<SessionResolver>,
    /// Ownership-checked chat operations
    pub chats: Arc<ChatGateway>,
    /// Configuration settings
    pub settings: Arc<Settings>,
    /// Login rate limiter, shared with the auth service
    pub auth_rate_limiter: Arc<AuthRateLimiter>,
}

impl AppState {
    /// Create a new application state with the echo reply generator
    pub fn new<S: Storage + 'static>(storage: S, config: &Settings) -> Result<Self, AppError> {
        Self::with_reply_generator(storage, config, Arc::new(EchoReply))
    }

    /// Create a new application state with a custom reply generator
    pub fn with_reply_generator<S: Storage + 'static>(
        storage: S,
        config: &Settings,
        replies: Arc<dyn ReplyGenerator>,
    ) -> Result<Self, AppError> {
        let storage = Arc::new(storage);
        let settings = Arc::new(config.clone());

        let params = config
            .password
            .scrypt_params()
            .map_err(|e| AppError::Internal(format!("Invalid scrypt parameters: {e}")))?;
        let tokens = Arc::new(TokenService::from_settings(&config.auth));
        let auth_rate_limiter = Arc::new(AuthRateLimiter::from_settings(&config.auth));

        let auth = Arc::new(DefaultAuth::new(
            storage.clone(),
            ScryptHasher::new(params),
            tokens.clone(),
            auth_rate_limiter.clone(),
            config.password.requirements(),
        )?);
        let sessions = Arc::new(SessionResolver::new(tokens, storage.clone()));
        let chats = Arc::new(ChatGateway::new(storage.clone(), storage, replies));

        Ok(Self {
            auth,
            sessions,
            chats,
            settings,
            auth_rate_limiter,
        })
    }
}
