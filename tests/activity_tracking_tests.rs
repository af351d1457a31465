// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity tracking through the HTTP surface.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use chrono::{DateTime, Utc};
use fitness_tracker::models::{Activity, ActivityType};
use fitness_tracker::services::{listener, ActivityListener, IntensityAdvisor, QueueBinding};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

mod common;

fn track_request(user_header: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/activities")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user_id) = user_header {
        builder = builder.header("X-User-ID", user_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn running_body() -> serde_json::Value {
    json!({
        "type": "RUNNING",
        "duration": 30,
        "caloriesBurned": 300,
        "additionalMetrics": {"distanceKm": 5.2},
        "startTime": "2026-03-14T07:30:00Z"
    })
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_valid_user_persists_one_activity() {
    let directory = common::mock_directory("kc-1", 200, json!(true)).await;
    let (app, state) = common::create_test_app(&directory.uri());
    let before = Utc::now();

    let response = app
        .oneshot(track_request(Some("kc-1"), running_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let returned: Activity = json_body(response).await;
    assert_eq!(returned.user_id, "kc-1");
    assert_eq!(returned.activity_type, ActivityType::Running);
    assert_eq!(returned.duration, 30);
    assert_eq!(returned.calories_burned, 300);
    assert_eq!(returned.additional_metrics["distanceKm"], json!(5.2));
    assert_eq!(returned.additional_metrics.len(), 1);
    assert_eq!(
        returned.start_time,
        Some("2026-03-14T07:30:00Z".parse::<DateTime<Utc>>().unwrap())
    );
    assert!(!returned.id.is_empty());
    assert_eq!(returned.created_at, returned.updated_at);
    assert!(returned.created_at >= before);

    let stored = state.db.activities_for_user("kc-1").await.unwrap();
    assert_eq!(stored, vec![returned]);
}

#[tokio::test]
async fn test_header_overrides_body_user() {
    let directory = common::mock_directory("kc-header", 200, json!(true)).await;
    let (app, state) = common::create_test_app(&directory.uri());

    let mut body = running_body();
    body["userId"] = json!("kc-body");

    let response = app
        .oneshot(track_request(Some("kc-header"), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(state.db.activities_for_user("kc-header").await.unwrap().len(), 1);
    assert!(state.db.activities_for_user("kc-body").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_body_user_used_without_header() {
    let directory = common::mock_directory("kc-body", 200, json!(true)).await;
    let (app, _state) = common::create_test_app(&directory.uri());

    let mut body = running_body();
    body["userId"] = json!("kc-body");

    let response = app.oneshot(track_request(None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let returned: Activity = json_body(response).await;
    assert_eq!(returned.user_id, "kc-body");
}

#[tokio::test]
async fn test_missing_owner_is_bad_request() {
    let directory = common::mock_directory("kc-1", 200, json!(true)).await;
    let (app, _state) = common::create_test_app(&directory.uri());

    let response = app
        .oneshot(track_request(None, running_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_user_rejected_and_nothing_stored() {
    let directory = common::mock_directory("kc-ghost", 200, json!(false)).await;
    let (app, state) = common::create_test_app(&directory.uri());

    let response = app
        .oneshot(track_request(Some("kc-ghost"), running_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body: serde_json::Value = json_body(response).await;
    assert_eq!(body["error"], "invalid_user");
    assert!(state.db.activities_for_user("kc-ghost").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_directory_not_found_propagates() {
    let directory = common::mock_directory("kc-missing", 404, json!({})).await;
    let (app, state) = common::create_test_app(&directory.uri());

    let response = app
        .oneshot(track_request(Some("kc-missing"), running_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(state.db.activities_for_user("kc-missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_duration_rejected() {
    let directory = common::mock_directory("kc-1", 200, json!(true)).await;
    let (app, state) = common::create_test_app(&directory.uri());

    let mut body = running_body();
    body["duration"] = json!(0);

    let response = app.oneshot(track_request(Some("kc-1"), body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.db.activities_for_user("kc-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_publish_failure_still_returns_record() {
    let directory = common::mock_directory("kc-1", 200, json!(true)).await;
    let events = Arc::new(common::FailingChannel::default());
    let (app, state) =
        common::create_test_app_with(common::test_config(&directory.uri()), events.clone());

    let response = app
        .oneshot(track_request(Some("kc-1"), running_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let returned: Activity = json_body(response).await;
    assert_eq!(events.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(
        state.db.get_activity(&returned.id).await.unwrap(),
        Some(returned)
    );
}

#[tokio::test]
async fn test_get_activity_by_id() {
    let directory = common::mock_directory("kc-1", 200, json!(true)).await;
    let (app, _state) = common::create_test_app(&directory.uri());

    let response = app
        .clone()
        .oneshot(track_request(Some("kc-1"), running_body()))
        .await
        .unwrap();
    let created: Activity = json_body(response).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/activities/{}", created.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Activity = json_body(response).await;
    assert_eq!(fetched, created);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/activities/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_requires_user_header() {
    let directory = common::mock_directory("kc-1", 200, json!(true)).await;
    let (app, _state) = common::create_test_app(&directory.uri());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/activities")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_returns_only_callers_activities() {
    let server = common::mock_directory("kc-a", 200, json!(true)).await;
    common::mount_validation(&server, "kc-b", 200, json!(true)).await;
    let (app, _state) = common::create_test_app(&server.uri());

    for user in ["kc-a", "kc-a", "kc-b"] {
        let response = app
            .clone()
            .oneshot(track_request(Some(user), running_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/activities")
                .header("X-User-ID", "kc-a")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let activities: Vec<Activity> = json_body(response).await;
    assert_eq!(activities.len(), 2);
    assert!(activities.iter().all(|a| a.user_id == "kc-a"));
}

#[tokio::test]
async fn test_tracked_activity_produces_recommendation() {
    let directory = common::mock_directory("kc-1", 200, json!(true)).await;
    let (app, state) = common::create_test_app(&directory.uri());

    let activity_listener = Arc::new(ActivityListener::new(
        state.db.clone(),
        Arc::new(IntensityAdvisor),
    ));
    listener::start(
        activity_listener,
        state.events.as_ref(),
        &QueueBinding::from_config(&state.config),
    )
    .await
    .unwrap();

    let response = app
        .oneshot(track_request(Some("kc-1"), running_body()))
        .await
        .unwrap();
    let created: Activity = json_body(response).await;

    let mut recommendation = None;
    for _ in 0..50 {
        recommendation = state
            .db
            .recommendation_for_activity(&created.id)
            .await
            .unwrap();
        if recommendation.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let recommendation = recommendation.expect("listener stored a recommendation");
    assert_eq!(recommendation.user_id, "kc-1");
    assert_eq!(recommendation.activity_type, ActivityType::Running);
}
