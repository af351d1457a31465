// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod recommendation;
pub mod user;

pub use activity::{Activity, ActivityRequest, ActivityType};
pub use recommendation::Recommendation;
pub use user::{RegisterRequest, User, UserResponse, UserRole};
