// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity model for storage, API and event payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Category of a tracked activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub enum ActivityType {
    Running,
    Walking,
    Cycling,
    Swimming,
    WeightTraining,
    Yoga,
    Hiit,
    Cardio,
    Stretching,
    Other,
}

impl ActivityType {
    /// Wire name, as stored and published.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Running => "RUNNING",
            ActivityType::Walking => "WALKING",
            ActivityType::Cycling => "CYCLING",
            ActivityType::Swimming => "SWIMMING",
            ActivityType::WeightTraining => "WEIGHT_TRAINING",
            ActivityType::Yoga => "YOGA",
            ActivityType::Hiit => "HIIT",
            ActivityType::Cardio => "CARDIO",
            ActivityType::Stretching => "STRETCHING",
            ActivityType::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored activity record.
///
/// This is also the payload published to the event channel, so the
/// recommendation listener deserializes exactly this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct Activity {
    /// Generated ID (also used as document ID)
    pub id: String,
    /// Owning user (external identity ID)
    pub user_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Duration in minutes
    pub duration: u32,
    pub calories_burned: u32,
    /// Free-form metrics (distance, heart rate, ...)
    #[serde(default)]
    pub additional_metrics: BTreeMap<String, Value>,
    pub start_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-submitted activity fields.
///
/// `user_id` is normally injected from the `X-User-ID` header by the route
/// handler; a body value is only used when the header is absent.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[validate(range(min = 1, message = "duration must be at least one minute"))]
    pub duration: u32,
    pub calories_burned: u32,
    #[serde(default)]
    pub additional_metrics: BTreeMap<String, Value>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

impl Activity {
    /// Build a new record for `user_id` from a request.
    ///
    /// The store assigns `id` and the timestamps on insert; the values set
    /// here are placeholders it overwrites.
    pub fn from_request(user_id: String, request: ActivityRequest) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            user_id,
            activity_type: request.activity_type,
            duration: request.duration,
            calories_burned: request.calories_burned,
            additional_metrics: request.additional_metrics,
            start_time: request.start_time,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_wire_names() {
        let json = serde_json::to_string(&ActivityType::WeightTraining).unwrap();
        assert_eq!(json, "\"WEIGHT_TRAINING\"");

        let parsed: ActivityType = serde_json::from_str("\"HIIT\"").unwrap();
        assert_eq!(parsed, ActivityType::Hiit);
        assert_eq!(parsed.to_string(), "HIIT");
    }

    #[test]
    fn test_request_uses_camel_case_and_type_field() {
        let body = serde_json::json!({
            "type": "RUNNING",
            "duration": 30,
            "caloriesBurned": 300,
            "additionalMetrics": {"distanceKm": 5.2}
        });

        let request: ActivityRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.activity_type, ActivityType::Running);
        assert_eq!(request.calories_burned, 300);
        assert!(request.user_id.is_none());
        assert!(request.start_time.is_none());
        assert_eq!(
            request.additional_metrics.get("distanceKm"),
            Some(&serde_json::json!(5.2))
        );
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let request = ActivityRequest {
            user_id: None,
            activity_type: ActivityType::Yoga,
            duration: 0,
            calories_burned: 10,
            additional_metrics: BTreeMap::new(),
            start_time: None,
        };

        assert!(request.validate().is_err());
    }

    #[cfg(feature = "binding-generation")]
    #[test]
    fn test_bindings_export_inside_crate() {
        let path = <Activity as TS>::output_path().unwrap();
        assert!(path.starts_with("bindings"), "{}", path.display());
    }
}
