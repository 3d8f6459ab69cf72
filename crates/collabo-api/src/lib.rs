//! Collabo REST API
//!
//! This crate provides the Axum-based HTTP surface over the auth core:
//! registration and login, profile management, user listing for system
//! administrators, and workspace membership management.

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, panic_response};
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
