//! User directory: registration, profiles and existence checks.

use crate::db::Db;
use crate::error::{AppError, Result};
use crate::models::{RegisterRequest, User, UserResponse, UserRole};
use chrono::Utc;
use validator::Validate;

#[derive(Clone)]
pub struct UserDirectory {
    db: Db,
}

impl UserDirectory {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Register a user. Registering an email that already exists returns the
    /// stored record unchanged.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse> {
        request.validate()?;

        if let Some(existing) = self.db.find_user_by_email(&request.email).await? {
            tracing::info!(user_id = %existing.id, "Email already registered, returning existing user");
            return Ok(existing.into());
        }

        let now = Utc::now();
        let user = User {
            id: String::new(),
            keycloak_id: request.keycloak_id,
            email: request.email,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            role: UserRole::User,
            created_at: now,
            updated_at: now,
        };

        let (stored, created) = self.db.create_user_if_absent(user).await?;
        if created {
            tracing::info!(user_id = %stored.id, "User registered");
        }
        Ok(stored.into())
    }

    pub async fn profile(&self, id: &str) -> Result<UserResponse> {
        self.db
            .get_user(id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    /// Whether a user with this identity-provider ID is registered.
    pub async fn exists(&self, keycloak_id: &str) -> Result<bool> {
        tracing::info!(user_id = keycloak_id, "Validating user");
        self.db.user_exists_by_keycloak_id(keycloak_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, first_name: &str, keycloak_id: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            keycloak_id: Some(keycloak_id.to_string()),
            first_name: first_name.to_string(),
            last_name: "Runner".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_same_email_twice_returns_first() {
        let directory = UserDirectory::new(Db::new_memory());

        let first = directory
            .register(request("sam@example.com", "Sam", "kc-1"))
            .await
            .unwrap();
        let second = directory
            .register(request("sam@example.com", "Samuel", "kc-2"))
            .await
            .unwrap();

        assert_eq!(second, first);
        assert_eq!(second.first_name, "Sam");
        assert_eq!(second.keycloak_id.as_deref(), Some("kc-1"));
        assert!(!directory.exists("kc-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_and_profile() {
        let directory = UserDirectory::new(Db::new_memory());
        let user = directory
            .register(request("kim@example.com", "Kim", "kc-kim"))
            .await
            .unwrap();

        assert!(directory.exists("kc-kim").await.unwrap());
        assert!(!directory.exists("kc-nobody").await.unwrap());
        assert_eq!(directory.profile(&user.id).await.unwrap(), user);
        assert!(matches!(
            directory.profile("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_registration_is_rejected() {
        let directory = UserDirectory::new(Db::new_memory());
        let mut bad = request("kim@example.com", "Kim", "kc-kim");
        bad.password = "123".to_string();

        assert!(matches!(
            directory.register(bad).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
