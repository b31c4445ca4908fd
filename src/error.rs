use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Twitter account not connected")]
    AccountNotConnected,

    #[error("{0}")]
    Reconnect(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Twitter API error: {message}")]
    TwitterApi {
        status: Option<u16>,
        message: String,
    },

    #[error("External service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl AppError {
    pub fn twitter_api(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::TwitterApi {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::Reconnect(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::AccountNotConnected | AppError::Jwt(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Request(_) | AppError::TwitterApi { .. } => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut details = None;

        let (code, message) = match &self {
            AppError::Unauthorized => {
                tracing::debug!("Rejected unauthenticated request");
                ("UNAUTHORIZED", self.to_string())
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => ("BAD_REQUEST", msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::AccountNotConnected => ("ACCOUNT_NOT_CONNECTED", self.to_string()),
            AppError::Reconnect(msg) => {
                tracing::warn!("Twitter reconnect required: {}", msg);
                ("RECONNECT_REQUIRED", msg.clone())
            }
            AppError::RateLimited => ("RATE_LIMITED", self.to_string()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("DATABASE_ERROR", "A database error occurred".to_string())
            }
            AppError::Jwt(e) => {
                tracing::warn!("OAuth state rejected: {:?}", e);
                ("INVALID_STATE", "Invalid or expired sign-in state".to_string())
            }
            AppError::Request(e) => {
                tracing::error!("HTTP request error: {:?}", e);
                (
                    "EXTERNAL_REQUEST_FAILED",
                    "Failed to communicate with external service".to_string(),
                )
            }
            AppError::TwitterApi {
                status: upstream,
                message,
            } => {
                tracing::error!("Twitter API error ({:?}): {}", upstream, message);
                details = upstream.map(|s| serde_json::json!({ "upstream_status": s }));
                ("TWITTER_API_ERROR", message.clone())
            }
            AppError::ServiceUnavailable(msg) => ("SERVICE_UNAVAILABLE", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Malformed input never reaches a handler; it surfaces as a validation error.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_maps_to_unauthorized() {
        let err = AppError::Reconnect("Please reconnect your account.".to_string());
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Please reconnect your account.");
    }

    #[test]
    fn upstream_failures_are_bad_gateway() {
        let err = AppError::twitter_api(Some(503), "Twitter sync failed (status 503).");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::AccountNotConnected.status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
