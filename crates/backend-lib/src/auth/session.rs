// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Resolution of presented tokens to authenticated users.
use std::sync::Arc;

use metrics::counter;

use super::token::TokenService;
use crate::error::AppError;
use crate::metrics::TOKEN_REJECTED;
use crate::storage::{CredentialStore, User};

/// Turns a bearer token into the principal for the rest of the request.
///
/// A token that fails verification and a valid token whose user no longer
/// exists produce the same `Unauthenticated` error.
pub struct SessionResolver {
    tokens: Arc<TokenService>,
    users: Arc<dyn CredentialStore>,
}

impl SessionResolver {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn CredentialStore>) -> Self {
        Self { tokens, users }
    }

    pub async fn resolve(&self, presented: &str) -> Result<User, AppError> {
        let user_id = match self.tokens.verify(presented) {
            Ok(user_id) => user_id,
            Err(reason) => {
                counter!(TOKEN_REJECTED).increment(1);
                tracing::debug!(%reason, "token rejected");
                return Err(AppError::Unauthenticated);
            },
        };

        match self.users.find_by_id(user_id).await? {
            Some(user) => Ok(user),
            None => {
                counter!(TOKEN_REJECTED).increment(1);
                tracing::debug!(%user_id, "token references a user that no longer exists");
                Err(AppError::Unauthenticated)
            },
        }
    }
}
