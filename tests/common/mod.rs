// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use fitness_tracker::config::Config;
use fitness_tracker::db::Db;
use fitness_tracker::routes::create_router;
use fitness_tracker::services::events::{Deliveries, EventError};
use fitness_tracker::services::{EventChannel, InProcessBroker, PublishTarget, QueueBinding};
use fitness_tracker::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config pointing every downstream service at `directory_url`.
#[allow(dead_code)]
pub fn test_config(directory_url: &str) -> Config {
    Config {
        user_service_url: directory_url.trim_end_matches('/').to_string(),
        ..Config::default()
    }
}

/// Create a test app with an in-memory store and the given event channel.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with(
    config: Config,
    events: Arc<dyn EventChannel>,
) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, Db::new_memory(), events));
    (create_router(state.clone()), state)
}

/// Create a test app whose directory lives at `directory_url`.
#[allow(dead_code)]
pub fn create_test_app(directory_url: &str) -> (axum::Router, Arc<AppState>) {
    create_test_app_with(test_config(directory_url), Arc::new(InProcessBroker::new()))
}

/// Answer `status` with `body` on one user's validation endpoint.
#[allow(dead_code)]
pub async fn mount_validation(
    server: &MockServer,
    user_id: &str,
    status: u16,
    body: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path(format!("/api/users/{}/validate", user_id)))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Start a mock directory with a single validation answer.
#[allow(dead_code)]
pub async fn mock_directory(user_id: &str, status: u16, body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    mount_validation(&server, user_id, status, body).await;
    server
}

/// Event channel whose publishes always fail.
#[derive(Default)]
#[allow(dead_code)]
pub struct FailingChannel {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl EventChannel for FailingChannel {
    async fn publish(&self, _target: &PublishTarget, _payload: Vec<u8>) -> Result<(), EventError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EventError::Publish("broker down".to_string()))
    }

    async fn subscribe(&self, _binding: &QueueBinding) -> Result<Deliveries, EventError> {
        Err(EventError::Subscribe("broker down".to_string()))
    }
}
