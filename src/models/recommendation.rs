// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Recommendation derived from a single tracked activity.

use crate::models::ActivityType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored recommendation record.
///
/// Only the activity listener creates these; there is no client-facing
/// creation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "bindings/")
)]
pub struct Recommendation {
    /// Generated ID (also used as document ID)
    pub id: String,
    /// Source activity
    pub activity_id: String,
    pub user_id: String,
    pub activity_type: ActivityType,
    /// Summary paragraph
    pub recommendation: String,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub safety: Vec<String>,
    pub created_at: DateTime<Utc>,
}
