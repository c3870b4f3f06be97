use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::services::AuthError;

/// Error returned by HTTP handlers. Rendered as `{"message", "error"?}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("Username or Email already exists")]
    Duplicate,
    #[error("Invalid email or password")]
    Unauthorized,
    #[error("Database error")]
    Database { detail: Option<String> },
    #[error("Internal server error")]
    Internal,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiError {
    /// Map a service error. `expose_detail` controls whether raw store
    /// errors reach the response body.
    pub fn from_auth(err: AuthError, expose_detail: bool) -> Self {
        match err {
            AuthError::MissingFields(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidEmail => ApiError::BadRequest("Invalid email"),
            AuthError::WeakPassword => {
                ApiError::BadRequest("Password should be at least 6 characters")
            }
            AuthError::Duplicate => ApiError::Duplicate,
            AuthError::InvalidCredentials => ApiError::Unauthorized,
            AuthError::Store(e) => {
                error!(error = %e, "store operation failed");
                ApiError::Database {
                    detail: expose_detail.then(|| e.to_string()),
                }
            }
            AuthError::Hash(e) => {
                error!(error = %e, "password hashing failed");
                ApiError::Internal
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Duplicate => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Database { .. } | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            message: self.to_string(),
            error: match self {
                ApiError::Database { detail } => detail,
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}
