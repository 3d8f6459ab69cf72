//! API error types

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use collabo_auth::{AuthError, ErrorKind};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body or query could not be decoded
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl ApiError {
    /// Status, error code and client-facing message
    fn parts(&self) -> (StatusCode, &'static str, String) {
        let err = match self {
            ApiError::BadRequest(msg) => {
                return (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone());
            }
            ApiError::Auth(err) => err,
        };

        match err.kind() {
            ErrorKind::Validation => {
                let message = match err {
                    AuthError::Validation(msg) => msg.clone(),
                    other => other.to_string(),
                };
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
            }
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT", err.to_string()),
            ErrorKind::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ),
            ErrorKind::Unauthorized => {
                debug!("Request rejected: {}", err);
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "Unauthorized".to_string(),
                )
            }
            ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string()),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
            ErrorKind::Timeout => {
                warn!("Request abandoned: {}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            ErrorKind::Internal => {
                error!("Internal error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        envelope(status, code, &message)
    }
}

fn envelope(status: StatusCode, code: &str, message: &str) -> Response {
    let body = axum::Json(json!({
        "success": false,
        "status_code": status.as_u16(),
        "message": message,
        "error": {
            "code": code,
            "message": message,
        }
    }));

    (status, body).into_response()
}

/// Panic handler for `CatchPanicLayer`; answers with a 500 envelope
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    error!("Handler panicked: {}", detail);

    envelope(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "Internal server error",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use collabo_db::DbError;

    fn status_of(err: AuthError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(AuthError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AuthError::EmailConflict), StatusCode::CONFLICT);
        assert_eq!(status_of(AuthError::MembershipConflict), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AuthError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AuthError::MembershipNotFound),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AuthError::InsufficientPermissions),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(AuthError::UserNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AuthError::MemberNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AuthError::Timeout), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_of(AuthError::Database(DbError::Migration("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_token_failures_share_one_message() {
        let messages: Vec<String> = [
            AuthError::MissingAuthHeader,
            AuthError::InvalidAuthHeader,
            AuthError::InvalidToken,
            AuthError::TokenExpired,
        ]
        .into_iter()
        .map(|e| ApiError::from(e).parts().2)
        .collect();
        assert!(messages.iter().all(|m| m == "Unauthorized"));
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let (_, code, message) =
            ApiError::from(AuthError::PasswordHash("salt exploded".into())).parts();
        assert_eq!(code, "INTERNAL_ERROR");
        assert_eq!(message, "Internal server error");
    }
}
