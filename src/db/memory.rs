// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store for local development and tests.
//!
//! Records keep their insertion order, which is what callers see as the
//! store's natural order for list queries.

use crate::models::{Activity, Recommendation, User};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A stored record tagged with its insertion sequence number.
#[derive(Debug, Clone)]
struct Sequenced<T> {
    seq: u64,
    record: T,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// Email -> user ID. Entry locking here is what makes emails unique.
    user_emails: DashMap<String, String>,
    activities: DashMap<String, Sequenced<Activity>>,
    recommendations: DashMap<String, Sequenced<Recommendation>>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    // ─── Users ───────────────────────────────────────────────────

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|u| u.clone())
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let id = self.user_emails.get(email)?.clone();
        self.get_user(&id)
    }

    pub fn user_exists_by_keycloak_id(&self, keycloak_id: &str) -> bool {
        self.users
            .iter()
            .any(|u| u.keycloak_id.as_deref() == Some(keycloak_id))
    }

    /// Insert `user` unless its email is taken. Returns the stored record and
    /// whether it was newly created.
    pub fn insert_user_if_absent(&self, user: User) -> (User, bool) {
        match self.user_emails.entry(user.email.clone()) {
            Entry::Occupied(mut existing) => {
                let stored = self.get_user(existing.get());
                match stored {
                    Some(stored) => (stored, false),
                    // Email index without a record: claim it for the new user
                    None => {
                        existing.insert(user.id.clone());
                        self.users.insert(user.id.clone(), user.clone());
                        (user, true)
                    }
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                (user, true)
            }
        }
    }

    // ─── Activities ──────────────────────────────────────────────

    pub fn insert_activity(&self, activity: Activity) {
        let seq = self.next_seq();
        self.activities.insert(
            activity.id.clone(),
            Sequenced {
                seq,
                record: activity,
            },
        );
    }

    pub fn get_activity(&self, id: &str) -> Option<Activity> {
        self.activities.get(id).map(|a| a.record.clone())
    }

    pub fn activities_for_user(&self, user_id: &str) -> Vec<Activity> {
        let mut matches: Vec<Sequenced<Activity>> = self
            .activities
            .iter()
            .filter(|a| a.record.user_id == user_id)
            .map(|a| a.value().clone())
            .collect();
        matches.sort_by_key(|a| a.seq);
        matches.into_iter().map(|a| a.record).collect()
    }

    // ─── Recommendations ─────────────────────────────────────────

    pub fn insert_recommendation(&self, recommendation: Recommendation) {
        let seq = self.next_seq();
        self.recommendations.insert(
            recommendation.id.clone(),
            Sequenced {
                seq,
                record: recommendation,
            },
        );
    }

    pub fn recommendations_for_user(&self, user_id: &str) -> Vec<Recommendation> {
        let mut matches: Vec<Sequenced<Recommendation>> = self
            .recommendations
            .iter()
            .filter(|r| r.record.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        matches.sort_by_key(|r| r.seq);
        matches.into_iter().map(|r| r.record).collect()
    }

    /// Most recent recommendation for an activity.
    pub fn recommendation_for_activity(&self, activity_id: &str) -> Option<Recommendation> {
        self.recommendations
            .iter()
            .filter(|r| r.record.activity_id == activity_id)
            .max_by_key(|r| r.seq)
            .map(|r| r.record.clone())
    }
}
