// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod events;
pub mod listener;
pub mod recommendation;
pub mod users;
pub mod validation;

pub use activity::ActivityTracker;
pub use events::{EventChannel, InProcessBroker, PublishTarget, QueueBinding};
pub use listener::ActivityListener;
pub use recommendation::{IntensityAdvisor, RecommendationGenerator, RecommendationService};
pub use users::UserDirectory;
pub use validation::{GatewayValidator, UserValidator, ValidationError};
