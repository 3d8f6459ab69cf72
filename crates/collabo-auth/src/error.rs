//! Authentication error types

use collabo_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailConflict,

    #[error("User is already a member of this workspace")]
    MembershipConflict,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Not a member of this workspace")]
    MembershipNotFound,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("User is not a member of this workspace")]
    MemberNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Workspace not found")]
    WorkspaceNotFound,

    #[error("Store call timed out")]
    Timeout,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token signing error: {0}")]
    Jwt(jsonwebtoken::errors::Error),

    #[error("Database error: {0}")]
    Database(DbError),
}

/// Coarse error categories the transport layer maps to status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input; safe to show the detail
    Validation,
    /// Uniqueness violation
    Conflict,
    /// Login rejected; deliberately vague
    InvalidCredentials,
    /// Missing, malformed, invalid or expired bearer token
    Unauthorized,
    /// Known identity without the required role or membership
    Forbidden,
    NotFound,
    /// A store call ran past its deadline and was abandoned
    Timeout,
    /// Storage, hashing or signing infrastructure failure
    Internal,
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::EmailConflict | AuthError::MembershipConflict => ErrorKind::Conflict,
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken
            | AuthError::TokenExpired => ErrorKind::Unauthorized,
            AuthError::MembershipNotFound | AuthError::InsufficientPermissions => {
                ErrorKind::Forbidden
            }
            AuthError::UserNotFound | AuthError::WorkspaceNotFound | AuthError::MemberNotFound => {
                ErrorKind::NotFound
            }
            AuthError::Timeout => ErrorKind::Timeout,
            AuthError::PasswordHash(_) | AuthError::Jwt(_) | AuthError::Database(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::DuplicateEmail(_) => AuthError::EmailConflict,
            DbError::DuplicateMembership { .. } => AuthError::MembershipConflict,
            other => AuthError::Database(other),
        }
    }
}
