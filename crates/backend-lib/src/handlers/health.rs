// ============================
// crates/backend-lib/src/handlers/health.rs
// ============================
//! Liveness endpoints.
use axum::Json;
use serde_json::{json, Value};

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Study Companion API running" }))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
