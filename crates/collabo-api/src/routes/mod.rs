//! API routes

mod auth;
mod extract;
mod health;
pub mod metrics;
pub mod types;
mod users;
mod workspaces;

use axum::Router;
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

pub use extract::{ApiJson, ApiQuery, RequireAuth};

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Registration and login
        .merge(auth::routes())
        // Profile and user listing
        .merge(users::routes())
        // Workspaces and memberships
        .merge(workspaces::routes())
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
