// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity event listener.
//!
//! Each delivery gets exactly one processing attempt: decode the activity,
//! generate a recommendation, store it. A failure is logged and the loop
//! moves on; redelivery is up to the transport.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{Activity, Recommendation};
use crate::services::events::{Deliveries, Delivery, EventChannel, EventError, QueueBinding};
use crate::services::recommendation::RecommendationGenerator;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct ActivityListener {
    db: Db,
    generator: Arc<dyn RecommendationGenerator>,
}

impl ActivityListener {
    pub fn new(db: Db, generator: Arc<dyn RecommendationGenerator>) -> Self {
        Self { db, generator }
    }

    /// Generate and store a recommendation for one activity.
    pub async fn process_activity(&self, activity: &Activity) -> Result<Recommendation> {
        tracing::info!(
            activity_id = %activity.id,
            user_id = %activity.user_id,
            "Processing activity for recommendation"
        );

        let recommendation = self.generator.generate(activity);
        self.db.create_recommendation(recommendation).await
    }

    /// Decode a delivery and process it.
    pub async fn handle_delivery(&self, delivery: &Delivery) -> Result<Recommendation> {
        let activity: Activity = serde_json::from_slice(&delivery.payload)
            .map_err(|e| AppError::BadRequest(format!("Invalid activity event: {}", e)))?;
        self.process_activity(&activity).await
    }

    /// Consume deliveries until the stream ends.
    pub async fn run(self: Arc<Self>, mut deliveries: Deliveries) {
        tracing::info!("Activity listener started");

        while let Some(delivery) = deliveries.next().await {
            match self.handle_delivery(&delivery).await {
                Ok(recommendation) => tracing::info!(
                    activity_id = %recommendation.activity_id,
                    recommendation_id = %recommendation.id,
                    "Recommendation stored"
                ),
                Err(e) => tracing::error!(
                    routing_key = %delivery.routing_key,
                    error = %e,
                    "Failed to process activity event"
                ),
            }
        }

        tracing::warn!("Activity listener stopped: delivery stream ended");
    }
}

/// Bind the listener's queue and spawn its consume loop.
///
/// The queue is bound before this returns, so events published afterwards
/// reach the listener.
pub async fn start(
    listener: Arc<ActivityListener>,
    channel: &dyn EventChannel,
    binding: &QueueBinding,
) -> std::result::Result<JoinHandle<()>, EventError> {
    let deliveries = channel.subscribe(binding).await?;
    Ok(tokio::spawn(listener.run(deliveries)))
}
