// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Clients for the user directory's validation and registration endpoints.
//!
//! Two flavours share one status translation:
//! - [`UserValidator`] is awaited inline by the activity tracker. Error
//!   statuses other than 404/400 mean "not validated".
//! - [`GatewayValidator`] hands back an owned future for the gateway's
//!   identity filter. Anything besides 404/400 is an unexpected error.

use crate::error::AppError;
use crate::models::{RegisterRequest, UserResponse};
use reqwest::{StatusCode, Url};
use std::future::Future;

/// Failures reported by the directory clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid request")]
    InvalidRequest,

    /// The directory could not be asked (connection failure, bad body).
    #[error("User validation unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UserNotFound => AppError::UserNotFound,
            ValidationError::InvalidRequest => {
                AppError::BadRequest("User directory rejected the request".to_string())
            }
            ValidationError::Unavailable(msg) => AppError::ValidationUnavailable(msg),
            ValidationError::Unexpected(msg) => AppError::Upstream(msg),
        }
    }
}

/// Map a directory error status to the domain error it stands for.
///
/// Only 404 and 400 carry meaning; every other status is left to the caller.
pub fn rejection_for_status(status: StatusCode) -> Option<ValidationError> {
    match status {
        StatusCode::NOT_FOUND => Some(ValidationError::UserNotFound),
        StatusCode::BAD_REQUEST => Some(ValidationError::InvalidRequest),
        _ => None,
    }
}

/// Build `{base}/api/users/{segments...}` with each segment percent-encoded.
fn directory_url(base_url: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(base_url).map_err(|e| format!("Invalid directory URL: {}", e))?;
    url.path_segments_mut()
        .map_err(|_| format!("Directory URL cannot be a base: {}", base_url))?
        .pop_if_empty()
        .extend(["api", "users"])
        .extend(segments);
    Ok(url)
}

// ─── Inline validator ────────────────────────────────────────────

/// Validator used by the activity tracker.
#[derive(Clone)]
pub struct UserValidator {
    http: reqwest::Client,
    base_url: String,
}

impl UserValidator {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Ask the directory whether `user_id` exists.
    ///
    /// Returns `Ok(false)` for error statuses other than 404/400.
    pub async fn validate(&self, user_id: &str) -> Result<bool, ValidationError> {
        let url = directory_url(&self.base_url, &[user_id, "validate"])
            .map_err(ValidationError::Unavailable)?;

        tracing::debug!(user_id, url = %url, "Validating user");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ValidationError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<bool>()
                .await
                .map_err(|e| ValidationError::Unavailable(format!("Invalid response: {}", e)));
        }

        if let Some(rejection) = rejection_for_status(status) {
            return Err(rejection);
        }

        tracing::warn!(
            user_id,
            status = status.as_u16(),
            "User validation failed, treating user as not validated"
        );
        Ok(false)
    }
}

// ─── Gateway validator ───────────────────────────────────────────

/// Validator used by the gateway. Calls return owned futures, so the caller
/// decides when (and on which task) to drive them.
#[derive(Clone)]
pub struct GatewayValidator {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayValidator {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Deferred check of whether `user_id` exists.
    pub fn validate(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<bool, ValidationError>> + Send + 'static {
        let http = self.http.clone();
        let url = directory_url(&self.base_url, &[user_id, "validate"]);
        let user_id = user_id.to_string();

        async move {
            let url = url.map_err(ValidationError::Unexpected)?;
            tracing::debug!(user_id = %user_id, "Validating user at gateway");

            let response = http
                .get(url)
                .send()
                .await
                .map_err(|e| ValidationError::Unexpected(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<bool>()
                    .await
                    .map_err(|e| ValidationError::Unexpected(format!("Invalid response: {}", e)));
            }

            Err(rejection_for_status(status).unwrap_or_else(|| {
                ValidationError::Unexpected(format!("Directory returned {}", status))
            }))
        }
    }

    /// Deferred registration of a user with the directory.
    pub fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl Future<Output = Result<UserResponse, ValidationError>> + Send + 'static {
        let http = self.http.clone();
        let url = directory_url(&self.base_url, &["register"]);
        let request = request.clone();

        async move {
            let url = url.map_err(ValidationError::Unexpected)?;
            tracing::info!(email = %request.email, "Registering user with directory");

            let response = http
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| ValidationError::Unexpected(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<UserResponse>()
                    .await
                    .map_err(|e| ValidationError::Unexpected(format!("Invalid response: {}", e)));
            }

            Err(match status {
                StatusCode::BAD_REQUEST => ValidationError::InvalidRequest,
                _ => ValidationError::Unexpected(format!("Registration failed with {}", status)),
            })
        }
    }
}
