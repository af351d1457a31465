// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness tracker server.
//!
//! Runs one service role (users, activities, recommendations, gateway) or
//! all backend roles together, as selected by `SERVICE_ROLE`.

use fitness_tracker::{
    config::{Config, EventBackend, ServiceRole},
    db::Db,
    services::{
        events::channel_from_config, listener, ActivityListener, IntensityAdvisor, QueueBinding,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        role = ?config.role,
        "Starting fitness tracker"
    );

    let db = Db::connect(&config).await?;
    let events = channel_from_config(&config)?;

    if config.role == ServiceRole::Activities && config.event_backend == EventBackend::InProcess {
        tracing::warn!("In-process events stay inside this process; no recommendation service will see them");
    }

    if config.role.serves_recommendations() {
        let binding = QueueBinding::from_config(&config);
        let activity_listener = Arc::new(ActivityListener::new(
            db.clone(),
            Arc::new(IntensityAdvisor),
        ));
        listener::start(activity_listener, events.as_ref(), &binding).await?;
        tracing::info!(
            queue = %binding.queue,
            exchange = %binding.exchange,
            routing_key = %binding.routing_key,
            "Activity listener started"
        );
    }

    let state = Arc::new(AppState::new(config.clone(), db, events));
    let app = fitness_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let tcp_listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(tcp_listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitness_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
