//! API error types with IntoResponse
//!
//! Errors are converted to `{"error", "message"}` JSON bodies with the
//! matching status code.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use novelvault_core::CoreError;
use serde_json::json;

use crate::auth::AuthError;
use crate::db::repos::DbError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Malformed request body or query (400)
    BadRequest { message: String },

    /// Account already exists (400)
    Conflict { message: String },

    /// No valid session (401)
    Unauthorized,

    /// Login failed (401)
    InvalidCredentials,

    /// Signed in but not allowed (403)
    Forbidden { reason: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Too many requests (429)
    RateLimited { retry_after_secs: u64 },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } | Self::Conflict { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::BadRequest { .. } => "bad_request",
            Self::Conflict { .. } => "conflict",
            Self::Unauthorized => "Authentication required",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::Database(_) | Self::Internal { .. } => "internal_error",
        }
    }

    /// Message safe to show a client; server-side failures stay generic
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::BadRequest { message } | Self::Conflict { message } => message.clone(),
            Self::Unauthorized => "Authentication required".to_string(),
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::Forbidden { reason } => reason.clone(),
            Self::NotFound { resource, id } => format!("{} '{}' not found", resource, id),
            Self::RateLimited { .. } => "Too many requests".to_string(),
            Self::Database(_) | Self::Internal { .. } => "an internal error occurred".to_string(),
        }
    }

    /// Log server-side failures; client errors are not logged
    pub fn log(&self) {
        match self {
            Self::Database(e) => tracing::error!("Database error: {}", e),
            Self::Internal { message } => tracing::error!("Internal error: {}", message),
            _ => {}
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log the actual error, return generic message
        self.log();

        let body = json!({
            "error": self.code(),
            "message": self.public_message(),
        });
        let mut response = (self.status(), Json(body)).into_response();

        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { message } => Self::Conflict { message },
            DbError::Invalid { message } => Self::BadRequest { message },
            _ => Self::Database(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Inactive => Self::Forbidden {
                reason: "Account is disabled".to_string(),
            },
            AuthError::Hash(message) => Self::Internal { message },
            AuthError::Validation(v) => Self::Validation(v),
            AuthError::Db(db) => db.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnknownCategory { value } => Self::NotFound {
                resource: "ranking category",
                id: value,
            },
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest {
            message: e.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest {
            message: e.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "content" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "content cannot be empty");
    }

    #[tokio::test]
    async fn unauthorized_body() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Authentication required");
    }

    #[tokio::test]
    async fn rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[tokio::test]
    async fn database_errors_are_generic() {
        let err = ApiError::from(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "an internal error occurred");
    }

    #[test]
    fn db_error_mapping() {
        assert!(matches!(
            ApiError::from(DbError::not_found("novel", 1)),
            ApiError::NotFound { resource: "novel", .. }
        ));
        assert_eq!(
            ApiError::from(DbError::Conflict { message: "Email already registered".into() }).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::from(DbError::invalid("x")).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unknown_category_is_404() {
        let err = ApiError::from(CoreError::unknown_category("weekly"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn inactive_account_is_403() {
        assert_eq!(ApiError::from(AuthError::Inactive).status(), StatusCode::FORBIDDEN);
    }
}
