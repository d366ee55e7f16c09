//! Domain error types for server operations.
//!
//! Each enum carries enough detail for structured logging; the
//! `IntoResponse` impls decide what a caller is allowed to see.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use std::fmt;

/// Configuration problems detected at startup.
#[derive(Debug)]
pub enum ConfigurationError {
    /// The backend URL is present but unusable.
    InvalidBackendUrl { value: String, reason: String },
    /// A required setting is missing.
    MissingKey { key: &'static str },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBackendUrl { value, reason } => {
                write!(f, "invalid backend url '{}': {}", value, reason)
            }
            Self::MissingKey { key } => write!(f, "missing required setting {}", key),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Errors from calls to the hosted auth/REST service.
#[derive(Debug)]
pub enum BackendError {
    /// The request could not be sent or its response not read.
    Transport { details: String },
    /// The service answered with a non-success status.
    Rejected { status: u16, message: String },
    /// The response body did not have the expected shape.
    InvalidResponse { details: String },
    /// The operation needs the service-role key, which is not configured.
    MissingServiceKey,
    /// Direct database access failed.
    Database { details: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { details } => write!(f, "backend request failed: {}", details),
            Self::Rejected { status, message } => {
                write!(f, "backend rejected request ({}): {}", status, message)
            }
            Self::InvalidResponse { details } => {
                write!(f, "unexpected backend response: {}", details)
            }
            Self::MissingServiceKey => write!(f, "service-role key is not configured"),
            Self::Database { details } => write!(f, "profile database error: {}", details),
        }
    }
}

impl std::error::Error for BackendError {}

impl BackendError {
    /// Returns true if the service refused the credentials it was given.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Rejected { status: 400 | 401 | 403, .. })
    }

    /// Returns the service's own message where there is one.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::MissingServiceKey => "Admin operations are not configured".to_string(),
            _ => "Backend service unavailable".to_string(),
        }
    }
}

/// Errors from the admin API.
#[derive(Debug)]
pub enum AdminError {
    /// Request body is missing the user ID.
    MissingUserId,
    /// The backing service is not configured.
    BackendUnavailable,
    /// Deleting the auth user failed.
    DeleteFailed { user_id: String, source: BackendError },
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUserId => write!(f, "user id required"),
            Self::BackendUnavailable => write!(f, "backend service is not configured"),
            Self::DeleteFailed { user_id, source } => {
                write!(f, "failed to delete user '{}': {}", user_id, source)
            }
        }
    }
}

impl std::error::Error for AdminError {}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MissingUserId => (StatusCode::BAD_REQUEST, "User ID required".to_string()),
            Self::BackendUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Backend service is not configured".to_string(),
            ),
            Self::DeleteFailed { user_id, source } => {
                tracing::error!(user_id = %user_id, error = %source, "Auth user deletion failed");
                (StatusCode::INTERNAL_SERVER_ERROR, source.public_message())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Errors from the login and logout routes.
#[derive(Debug)]
pub enum LoginError {
    /// The backing service is not configured.
    BackendUnavailable,
    /// Email or password is missing.
    MissingCredentials,
    /// The service rejected the email/password pair.
    InvalidCredentials,
    /// The service could not be reached.
    Backend { details: String },
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendUnavailable => write!(f, "backend service is not configured"),
            Self::MissingCredentials => write!(f, "email and password are required"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Backend { details } => write!(f, "login failed: {}", details),
        }
    }
}

impl std::error::Error for LoginError {}

impl LoginError {
    /// Query value shown by the login page.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BackendUnavailable => "unavailable",
            Self::MissingCredentials => "missing_credentials",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Backend { .. } => "backend_error",
        }
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        match self {
            Self::BackendUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication backend is not configured",
            )
                .into_response(),
            Self::Backend { ref details } => {
                tracing::error!(error = %details, "Login request to backend failed");
                Redirect::to(&format!("/?error={}", self.code())).into_response()
            }
            other => Redirect::to(&format!("/?error={}", other.code())).into_response(),
        }
    }
}
