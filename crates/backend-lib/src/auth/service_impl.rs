use std::sync::Arc;

use async_trait::async_trait;
use companion_common::{AuthResponse, Credentials, UserId};
use metrics::counter;
use tracing::instrument;
use zeroize::Zeroizing;

use crate::auth::{AuthRateLimiter, AuthService, PasswordRequirements, ScryptHasher, TokenService};
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, LOGIN_THROTTLED, USER_REGISTERED};
use crate::storage::CredentialStore;
use crate::validation::{validate_new_password, validate_username};

/// Hashed at startup and verified against when a username is unknown, so a
/// failed login costs the same whether or not the account exists.
const DUMMY_PASSWORD: &str = "dummy-password-for-timing";

pub struct DefaultAuth {
    users: Arc<dyn CredentialStore>,
    hasher: ScryptHasher,
    tokens: Arc<TokenService>,
    rate_limiter: Arc<AuthRateLimiter>,
    requirements: PasswordRequirements,
    dummy_hash: String,
}

impl DefaultAuth {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        hasher: ScryptHasher,
        tokens: Arc<TokenService>,
        rate_limiter: Arc<AuthRateLimiter>,
        requirements: PasswordRequirements,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            users,
            hasher,
            tokens,
            rate_limiter,
            requirements,
            dummy_hash,
        })
    }

    fn issue(&self, user_id: UserId) -> Result<AuthResponse, AppError> {
        let token = self
            .tokens
            .issue(user_id)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(AuthResponse { user_id, token })
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn register(&self, credentials: Credentials) -> Result<AuthResponse, AppError> {
        let Credentials { username, password } = credentials;
        let password = Zeroizing::new(password);

        validate_username(&username)?;
        validate_new_password(&password, &self.requirements)?;

        let password_hash = self.hasher.hash_blocking(password).await?;
        let user_id = self.users.create_user(&username, &password_hash).await?;

        counter!(USER_REGISTERED).increment(1);
        tracing::info!(%user_id, "user registered");
        self.issue(user_id)
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    async fn login(&self, credentials: Credentials) -> Result<AuthResponse, AppError> {
        let Credentials { username, password } = credentials;
        let password = Zeroizing::new(password);

        // Names that could never be registered stay out of the rate limiter
        if validate_username(&username).is_err() {
            counter!(LOGIN_FAILED).increment(1);
            tracing::info!("login failed");
            return Err(AppError::Unauthenticated);
        }

        if !self.rate_limiter.begin_attempt(&username) {
            counter!(LOGIN_THROTTLED).increment(1);
            return Err(AppError::AuthRateLimited);
        }

        let user = self.users.find_by_username(&username).await?;
        let (user_id, stored_hash) = match user {
            Some(user) => (Some(user.id), user.password_hash),
            None => (None, self.dummy_hash.clone()),
        };

        let matches = self.hasher.verify_blocking(password, stored_hash).await?;

        match (user_id, matches) {
            (Some(user_id), true) => {
                self.rate_limiter.record_success(&username);
                counter!(LOGIN_SUCCEEDED).increment(1);
                tracing::info!(%user_id, "login succeeded");
                self.issue(user_id)
            },
            // Already counted by begin_attempt
            _ => {
                counter!(LOGIN_FAILED).increment(1);
                tracing::info!("login failed");
                Err(AppError::Unauthenticated)
            },
        }
    }
}
