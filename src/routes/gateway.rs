// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gateway forwarding routes.
//!
//! Requests under each service prefix are relayed to that service with
//! method, path, query, headers and body intact. The identity filter runs
//! first (see routes/mod.rs), so the forwarded request carries `X-User-ID`.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::AppState;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName},
    response::Response,
    routing::any,
    Router,
};
use std::sync::Arc;

/// Largest request body the gateway will buffer.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", any(forward))
        .route("/api/users/{*rest}", any(forward))
        .route("/api/activities", any(forward))
        .route("/api/activities/{*rest}", any(forward))
        .route("/api/recommendations", any(forward))
        .route("/api/recommendations/{*rest}", any(forward))
}

/// Base URL of the service that owns `path`.
pub fn upstream_for<'a>(config: &'a Config, path: &str) -> Option<&'a str> {
    let owns = |prefix: &str| path == prefix || path.starts_with(&format!("{}/", prefix));

    if owns("/api/users") {
        Some(&config.user_service_url)
    } else if owns("/api/activities") {
        Some(&config.activity_service_url)
    } else if owns("/api/recommendations") {
        Some(&config.recommendation_service_url)
    } else {
        None
    }
}

/// Headers that describe one connection and must not be relayed.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    ) || name == header::HOST
        || name == header::CONTENT_LENGTH
}

/// Copy of `from` without connection-level headers.
fn end_to_end_headers(from: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(from.len());
    for (name, value) in from.iter() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

async fn forward(State(state): State<Arc<AppState>>, request: Request) -> Result<Response> {
    let path = request.uri().path().to_string();
    let upstream = upstream_for(&state.config, &path)
        .ok_or_else(|| AppError::NotFound(format!("No route for {}", path)))?;

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(path.as_str());
    let url = format!("{}{}", upstream, path_and_query);

    let (parts, body) = request.into_parts();
    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("Unreadable request body: {}", e)))?;

    tracing::debug!(method = %parts.method, url = %url, "Forwarding request");

    let upstream_response = state
        .http
        .request(parts.method.clone(), &url)
        .headers(end_to_end_headers(&parts.headers))
        .body(body)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("{} unreachable: {}", upstream, e)))?;

    let status = upstream_response.status();
    let headers = end_to_end_headers(upstream_response.headers());
    let bytes = upstream_response
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
