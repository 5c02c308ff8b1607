// ============================
// crates/backend-lib/src/handlers/chat.rs
// ============================
//! Chat endpoints. Both require a bearer token; the `AuthUser` extractor runs
//! before the body or query string is looked at, so a malformed request from
//! an anonymous caller is still a 401.
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use companion_common::{HistoryQuery, HistoryResponse, SendRequest, SendResponse};

use crate::{error::AppError, middleware::AuthUser, AppState};

/// `POST /api/chat/send`
pub async fn send(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, AppError> {
    let Json(request) = body?;
    state
        .chats
        .send(&principal, &request.message, request.chat_id)
        .await
        .map(Json)
}

/// `GET /api/chat/history?chat_id=...`
pub async fn history(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(query) = query?;
    state
        .chats
        .history(&principal, query.chat_id)
        .await
        .map(Json)
}
