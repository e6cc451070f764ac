//! Common test utilities for backend API tests
//!
//! Builds the full router over the in-memory store and drives it with
//! `tower::ServiceExt::oneshot`, so no database or socket is needed.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use log_ingestor_backend::api::{routes::create_router, AppState, SharedState};
use log_ingestor_backend::config::Config;
use log_ingestor_backend::services::auth_service::AuthService;
use log_ingestor_backend::storage::{MemoryStore, Stores};

use fixtures::TestUser;

/// Router plus the state behind it
pub struct TestApp {
    pub router: Router,
    pub state: SharedState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::in_memory())
    }

    /// App that requires a token for writes
    pub fn with_write_auth() -> Self {
        let mut config = Config::in_memory();
        config.require_auth_for_writes = true;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let stores = Stores::shared(Arc::new(MemoryStore::new()));
        let state = Arc::new(AppState::new(config, stores));
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    pub async fn create_user(&self, user: &TestUser) {
        AuthService::new(self.state.stores.accounts.clone())
            .create_user(&user.username, &user.password, false)
            .await
            .expect("Failed to create test user");
    }

    /// Send a request and decode the JSON response body (Null when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), None).await
    }

    /// POST a record and return its id.
    pub async fn create_record(&self, body: Value) -> String {
        let (status, json) = self.post("/", body).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
        json["id"].as_str().unwrap().to_string()
    }

    /// Messages of the records a list query returns, in order.
    pub async fn messages(&self, uri: &str) -> Vec<String> {
        let (status, json) = self.get(uri).await;
        assert_eq!(status, StatusCode::OK, "list failed: {json}");
        json.as_array()
            .unwrap()
            .iter()
            .map(|r| r["message"].as_str().unwrap().to_string())
            .collect()
    }
}
