// crates/backend-lib/src/middleware/auth.rs

//! Bearer-token authentication extractor.
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::AppError;
use crate::storage::User;
use crate::AppState;

/// Authenticated principal of the current request.
///
/// Extracting this resolves the `Authorization: Bearer <token>` header through
/// the session resolver; handlers that take it never run for anonymous or
/// forged requests.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = state.sessions.resolve(token).await?;
        Ok(AuthUser(user))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
/// A missing header, another scheme, or an empty token is `Unauthenticated`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthenticated)?
        .to_str()
        .map_err(|_| AppError::Unauthenticated)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AppError::Unauthenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthenticated);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthenticated);
    }
    Ok(token)
}
