//! Shared helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use companion_backend_lib::{
    config::Settings,
    router::create_router,
    storage::{DatabasePool, SqliteStorage},
    AppState,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub storage: SqliteStorage,
    _dir: TempDir,
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.signing_key = Some("integration-signing-key-0123456789".to_string());
    settings.password.scrypt_log_n = 4;
    settings
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_settings(test_settings()).await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
        let storage = SqliteStorage::new(DatabasePool::connect(&url, 2).await.unwrap());
        let state = AppState::new(storage.clone(), &settings).unwrap();
        Self {
            router: create_router(Arc::new(state)),
            storage,
            _dir: dir,
        }
    }

    /// Rebuild the application over the same database with new settings
    pub fn restart(self, settings: &Settings) -> Self {
        let state = AppState::new(self.storage.clone(), settings).unwrap();
        Self {
            router: create_router(Arc::new(state)),
            ..self
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    /// POST a raw, possibly malformed, JSON body
    pub async fn post_raw(&self, uri: &str, token: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(serde_json::json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Register and return `(user_id, token)`
    pub async fn signup(&self, username: &str) -> (i64, String) {
        let (status, body) = self.register(username, "correct horse").await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (
            body["user_id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn send(
        &self,
        token: Option<&str>,
        message: &str,
        chat_id: Option<i64>,
    ) -> (StatusCode, Value) {
        let mut body = serde_json::json!({ "message": message });
        if let Some(chat_id) = chat_id {
            body["chat_id"] = chat_id.into();
        }
        self.request(Method::POST, "/api/chat/send", token, Some(body))
            .await
    }

    pub async fn history(&self, token: Option<&str>, chat_id: i64) -> (StatusCode, Value) {
        self.request(
            Method::GET,
            &format!("/api/chat/history?chat_id={chat_id}"),
            token,
            None,
        )
        .await
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.storage.pool().reader)
            .await
            .unwrap();
        n
    }
}
