//! Collabo Database Layer
//!
//! This crate provides the storage abstraction used by the auth core
//! (the `UserDirectory`, `MembershipStore` and `WorkspaceStore` traits)
//! and a SQLite implementation of it via sqlx.

pub mod error;
pub mod models;
pub mod repository;
pub mod store;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::Database;
pub use store::{MembershipStore, UserDirectory, WorkspaceStore};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
