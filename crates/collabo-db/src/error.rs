//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("User {user_id} is already a member of workspace {workspace_id}")]
    DuplicateMembership {
        workspace_id: uuid::Uuid,
        user_id: uuid::Uuid,
    },

    #[error("Migration error: {0}")]
    Migration(String),
}

impl DbError {
    /// Whether a raw sqlx error is a UNIQUE / PRIMARY KEY constraint violation.
    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        match err {
            sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
