// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitness tracker services.
//!
//! One crate backs four services: the user directory, activity tracking,
//! recommendation generation, and the gateway in front of them. Activities
//! are validated against the directory, stored, and published to an event
//! channel; the recommendation listener consumes those events.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::Db;
use services::{
    ActivityTracker, EventChannel, GatewayValidator, PublishTarget, RecommendationService,
    UserDirectory, UserValidator,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    /// Client for outbound calls (directory, gateway forwarding)
    pub http: reqwest::Client,
    pub events: Arc<dyn EventChannel>,
    pub directory: UserDirectory,
    pub tracker: ActivityTracker,
    pub recommendations: RecommendationService,
    pub gateway_validator: GatewayValidator,
}

impl AppState {
    /// Wire the services from configuration and their collaborators.
    pub fn new(config: Config, db: Db, events: Arc<dyn EventChannel>) -> Self {
        let http = reqwest::Client::new();

        let tracker = ActivityTracker::new(
            db.clone(),
            UserValidator::new(http.clone(), config.user_service_url.clone()),
            events.clone(),
            PublishTarget::from_config(&config),
        );
        let gateway_validator = GatewayValidator::new(http.clone(), config.user_service_url.clone());

        Self {
            directory: UserDirectory::new(db.clone()),
            recommendations: RecommendationService::new(db.clone()),
            tracker,
            gateway_validator,
            http,
            events,
            db,
            config,
        }
    }
}
