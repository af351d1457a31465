// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity tracking routes.

use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityRequest};
use crate::routes::user_id_header;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/activities",
            get(get_user_activities).post(track_activity),
        )
        .route("/api/activities/{id}", get(get_activity))
}

/// Track a new activity. The `X-User-ID` header, when present, names the
/// owner and overrides any `userId` in the body.
async fn track_activity(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut request): Json<ActivityRequest>,
) -> Result<Json<Activity>> {
    if let Some(user_id) = user_id_header(&headers) {
        request.user_id = Some(user_id);
    }

    Ok(Json(state.tracker.track_activity(request).await?))
}

async fn get_user_activities(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Activity>>> {
    let user_id = user_id_header(&headers)
        .ok_or_else(|| AppError::BadRequest("Missing X-User-ID header".to_string()))?;

    tracing::debug!(user_id = %user_id, "Fetching activities");
    Ok(Json(state.tracker.user_activities(&user_id).await?))
}

async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Activity>> {
    Ok(Json(state.tracker.activity_by_id(&id).await?))
}
