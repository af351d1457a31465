// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity tracking service.
//!
//! Handles the core workflow:
//! 1. Validate the owning user against the directory
//! 2. Store the activity (the store assigns ID and timestamps)
//! 3. Publish the stored record for the recommendation listener
//!
//! Publication is fire-and-forget. A failed publish is logged and the caller
//! still gets the stored activity; nothing is retried or rolled back.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{Activity, ActivityRequest};
use crate::services::events::{publish_json, EventChannel, PublishTarget};
use crate::services::UserValidator;
use std::sync::Arc;
use validator::Validate;

/// Orchestrates validation, persistence and event publication.
#[derive(Clone)]
pub struct ActivityTracker {
    db: Db,
    validator: UserValidator,
    events: Arc<dyn EventChannel>,
    target: PublishTarget,
}

impl ActivityTracker {
    pub fn new(
        db: Db,
        validator: UserValidator,
        events: Arc<dyn EventChannel>,
        target: PublishTarget,
    ) -> Self {
        Self {
            db,
            validator,
            events,
            target,
        }
    }

    /// Track a new activity for the user named in `request.user_id`.
    pub async fn track_activity(&self, request: ActivityRequest) -> Result<Activity> {
        request.validate()?;

        let user_id = request
            .user_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing user ID".to_string()))?;

        tracing::info!(
            user_id = %user_id,
            activity_type = %request.activity_type,
            "Tracking activity"
        );

        // 1. Validate user
        if !self.validator.validate(&user_id).await? {
            tracing::warn!(user_id = %user_id, "User failed validation");
            return Err(AppError::InvalidUser(user_id));
        }

        // 2. Store
        let activity = self
            .db
            .create_activity(Activity::from_request(user_id, request))
            .await?;

        // 3. Publish (best effort)
        self.publish_best_effort(&activity).await;

        Ok(activity)
    }

    /// Publish `activity`, logging instead of returning any failure.
    async fn publish_best_effort(&self, activity: &Activity) {
        match publish_json(self.events.as_ref(), &self.target, activity).await {
            Ok(()) => tracing::debug!(
                activity_id = %activity.id,
                exchange = %self.target.exchange,
                routing_key = %self.target.routing_key,
                "Activity event published"
            ),
            Err(e) => tracing::error!(
                activity_id = %activity.id,
                error = %e,
                "Failed to publish activity event"
            ),
        }
    }

    /// All activities owned by `user_id`, in the store's natural order.
    pub async fn user_activities(&self, user_id: &str) -> Result<Vec<Activity>> {
        self.db.activities_for_user(user_id).await
    }

    pub async fn activity_by_id(&self, id: &str) -> Result<Activity> {
        self.db
            .get_activity(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))
    }
}
