// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration and login endpoints.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use companion_common::{AuthResponse, Credentials};

use crate::{error::AppError, AppState};

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(credentials) = body?;
    state.auth.register(credentials).await.map(Json)
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(credentials) = body?;
    state.auth.login(credentials).await.map(Json)
}
