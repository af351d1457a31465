//! User directory routes.

use crate::error::Result;
use crate::models::{RegisterRequest, UserResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/{user_id}", get(get_profile))
        .route("/api/users/{user_id}/validate", get(validate_user))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<UserResponse>> {
    Ok(Json(state.directory.register(request).await?))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>> {
    Ok(Json(state.directory.profile(&user_id).await?))
}

/// Whether the identity-provider user ID is registered.
async fn validate_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<bool>> {
    Ok(Json(state.directory.exists(&user_id).await?))
}
