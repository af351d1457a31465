//! Recommendation lookup routes. Recommendations are only created by the
//! activity listener, so there is no write route.

use crate::error::Result;
use crate::models::Recommendation;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/recommendations/user/{user_id}",
            get(get_user_recommendations),
        )
        .route(
            "/api/recommendations/activity/{activity_id}",
            get(get_activity_recommendation),
        )
}

async fn get_user_recommendations(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Recommendation>>> {
    Ok(Json(state.recommendations.user_recommendations(&user_id).await?))
}

async fn get_activity_recommendation(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<String>,
) -> Result<Json<Recommendation>> {
    Ok(Json(
        state
            .recommendations
            .activity_recommendation(&activity_id)
            .await?,
    ))
}
