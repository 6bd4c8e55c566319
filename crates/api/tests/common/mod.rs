//! Shared helpers for API integration tests.
//!
//! The app runs against the in-memory roster store, so these tests need no
//! database.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use shiftguard_api::auth::jwt::{generate_access_token, JwtConfig};
use shiftguard_api::config::ServerConfig;
use shiftguard_api::router::build_app_router;
use shiftguard_api::state::AppState;
use shiftguard_core::roles::{ROLE_ADMIN, ROLE_GUARD};
use shiftguard_core::types::DbId;
use shiftguard_engine::config::EngineConfig;
use shiftguard_engine::store::{MemoryRosterStore, RosterStore};
use shiftguard_engine::Engine;
use shiftguard_events::{EventBus, GuardNotification, NotificationDispatcher, Notifier};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        engine: EngineConfig::default(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub engine: Arc<Engine>,
    pub store: Arc<MemoryRosterStore>,
    pub config: ServerConfig,
    /// Keeps the notification queue open.
    pub notifications: mpsc::Receiver<GuardNotification>,
}

/// Build the full application router over a fresh in-memory store.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryRosterStore::new());
    let event_bus = Arc::new(EventBus::default());
    let (dispatcher, notifications) = NotificationDispatcher::channel(64);

    let engine = Arc::new(Engine::new(
        store.clone() as Arc<dyn RosterStore>,
        config.engine.policy.clone(),
        Arc::clone(&event_bus),
        Arc::new(dispatcher) as Arc<dyn Notifier>,
    ));
    let state = AppState {
        engine: Arc::clone(&engine),
        config: Arc::new(config.clone()),
        event_bus,
    };

    TestApp {
        router: build_app_router(state, &config),
        engine,
        store,
        config,
        notifications,
    }
}

impl TestApp {
    pub fn token(&self, guard_id: DbId, role: &str) -> String {
        generate_access_token(guard_id, role, &self.config.jwt).unwrap()
    }

    pub fn admin_token(&self) -> String {
        self.token(1_000, ROLE_ADMIN)
    }

    pub fn guard_token(&self, guard_id: DbId) -> String {
        self.token(guard_id, ROLE_GUARD)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(Method::POST, uri, Some(token), None).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    /// Register a guard through the API and return its id.
    pub async fn register_guard(&self, name: &str) -> DbId {
        let response = self
            .post(
                "/api/v1/guards",
                &self.admin_token(),
                serde_json::json!({ "full_name": name }),
            )
            .await;
        assert_eq!(response.status(), 201);
        body_json(response).await["data"]["id"].as_i64().unwrap()
    }
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
