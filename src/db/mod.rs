//! Database layer.
//!
//! [`Db`] is the single handle services hold. It assigns generated IDs and
//! timestamps on insert, then delegates to Firestore or to the in-memory
//! store.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use crate::models::{Activity, Recommendation, User};
use chrono::Utc;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const ACTIVITIES: &str = "activities";
    pub const RECOMMENDATIONS: &str = "recommendations";
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(Arc<MemoryStore>),
    /// Every operation fails; used to exercise store-failure paths.
    Offline,
}

/// Database handle shared by all services.
#[derive(Clone)]
pub struct Db {
    backend: Backend,
}

impl Db {
    /// Connect to the backend selected in `config`.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match config.store_backend {
            StoreBackend::Firestore => Ok(Self {
                backend: Backend::Firestore(FirestoreStore::new(&config.gcp_project_id).await?),
            }),
            StoreBackend::Memory => {
                tracing::info!("Using in-memory store");
                Ok(Self::new_memory())
            }
        }
    }

    /// Create an empty in-memory database.
    pub fn new_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    /// Create a mock database for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── Users ───────────────────────────────────────────────────

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.get_user(id).await,
            Backend::Memory(mem) => Ok(mem.get_user(id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.find_user_by_email(email).await,
            Backend::Memory(mem) => Ok(mem.find_user_by_email(email)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    pub async fn user_exists_by_keycloak_id(&self, keycloak_id: &str) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.user_exists_by_keycloak_id(keycloak_id).await,
            Backend::Memory(mem) => Ok(mem.user_exists_by_keycloak_id(keycloak_id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create a user unless the email is already registered.
    ///
    /// Returns the stored record (the pre-existing one on a duplicate email)
    /// and whether a new record was created.
    pub async fn create_user_if_absent(&self, mut user: User) -> Result<(User, bool), AppError> {
        let now = Utc::now();
        user.id = uuid::Uuid::new_v4().to_string();
        user.created_at = now;
        user.updated_at = now;

        match &self.backend {
            Backend::Firestore(fs) => fs.insert_user_if_absent(user).await,
            Backend::Memory(mem) => Ok(mem.insert_user_if_absent(user)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    // ─── Activities ──────────────────────────────────────────────

    /// Persist a new activity, assigning its ID and timestamps.
    pub async fn create_activity(&self, mut activity: Activity) -> Result<Activity, AppError> {
        let now = Utc::now();
        activity.id = uuid::Uuid::new_v4().to_string();
        activity.created_at = now;
        activity.updated_at = now;

        match &self.backend {
            Backend::Firestore(fs) => fs.insert_activity(&activity).await?,
            Backend::Memory(mem) => mem.insert_activity(activity.clone()),
            Backend::Offline => return Err(Self::offline()),
        }

        Ok(activity)
    }

    pub async fn get_activity(&self, id: &str) -> Result<Option<Activity>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.get_activity(id).await,
            Backend::Memory(mem) => Ok(mem.get_activity(id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    pub async fn activities_for_user(&self, user_id: &str) -> Result<Vec<Activity>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.activities_for_user(user_id).await,
            Backend::Memory(mem) => Ok(mem.activities_for_user(user_id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    // ─── Recommendations ─────────────────────────────────────────

    /// Persist a new recommendation, assigning its ID and creation time.
    pub async fn create_recommendation(
        &self,
        mut recommendation: Recommendation,
    ) -> Result<Recommendation, AppError> {
        recommendation.id = uuid::Uuid::new_v4().to_string();
        recommendation.created_at = Utc::now();

        match &self.backend {
            Backend::Firestore(fs) => fs.insert_recommendation(&recommendation).await?,
            Backend::Memory(mem) => mem.insert_recommendation(recommendation.clone()),
            Backend::Offline => return Err(Self::offline()),
        }

        Ok(recommendation)
    }

    pub async fn recommendations_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Recommendation>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.recommendations_for_user(user_id).await,
            Backend::Memory(mem) => Ok(mem.recommendations_for_user(user_id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    pub async fn recommendation_for_activity(
        &self,
        activity_id: &str,
    ) -> Result<Option<Recommendation>, AppError> {
        match &self.backend {
            Backend::Firestore(fs) => fs.recommendation_for_activity(activity_id).await,
            Backend::Memory(mem) => Ok(mem.recommendation_for_activity(activity_id)),
            Backend::Offline => Err(Self::offline()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityType, UserRole};
    use std::collections::BTreeMap;

    fn activity(user_id: &str) -> Activity {
        let now = Utc::now();
        Activity {
            id: String::new(),
            user_id: user_id.to_string(),
            activity_type: ActivityType::Cycling,
            duration: 45,
            calories_burned: 500,
            additional_metrics: BTreeMap::new(),
            start_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(email: &str, first_name: &str) -> User {
        let now = Utc::now();
        User {
            id: String::new(),
            keycloak_id: Some(format!("kc-{}", first_name)),
            email: email.to_string(),
            password: "secret123".to_string(),
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_activity_assigns_id() {
        let db = Db::new_memory();

        let first = db.create_activity(activity("u1")).await.unwrap();
        let second = db.create_activity(activity("u1")).await.unwrap();

        assert!(!first.id.is_empty());
        assert_ne!(first.id, second.id);
        assert_eq!(db.get_activity(&first.id).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_activities_for_user_keeps_insertion_order() {
        let db = Db::new_memory();

        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(db.create_activity(activity("u1")).await.unwrap().id);
        }
        db.create_activity(activity("someone-else")).await.unwrap();

        let listed: Vec<String> = db
            .activities_for_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_duplicate_email_returns_existing_user() {
        let db = Db::new_memory();

        let (first, created) = db
            .create_user_if_absent(user("dup@example.com", "First"))
            .await
            .unwrap();
        assert!(created);

        let (second, created) = db
            .create_user_if_absent(user("dup@example.com", "Second"))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second, first);
        assert!(db.user_exists_by_keycloak_id("kc-First").await.unwrap());
        assert!(!db.user_exists_by_keycloak_id("kc-Second").await.unwrap());
    }

    #[tokio::test]
    async fn test_offline_db_fails() {
        let db = Db::new_mock();

        let err = db.create_activity(activity("u1")).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert!(db.get_activity("a1").await.is_err());
    }
}
