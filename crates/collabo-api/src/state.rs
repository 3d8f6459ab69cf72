//! Application state

use std::sync::Arc;

use collabo_auth::{AccessGuard, AuthConfig, AuthError, AuthService, TokenIssuer, WorkspaceService};
use collabo_db::Database;
use metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthService,
    pub guard: AccessGuard,
    pub workspaces: WorkspaceService,
}

impl AppState {
    /// Wire the auth core onto a database
    pub fn new(db: Database, config: &AuthConfig) -> Result<Self, AuthError> {
        let store = Arc::new(db.clone());
        let issuer = Arc::new(TokenIssuer::from_config(config));

        let auth = AuthService::new(store.clone(), issuer.clone(), config)?;
        let guard = AccessGuard::new(issuer, store.clone(), config.store_timeout);
        let workspaces = WorkspaceService::new(
            store.clone(),
            store.clone(),
            store,
            guard.clone(),
            config.store_timeout,
        );

        Ok(Self {
            db,
            auth,
            guard,
            workspaces,
        })
    }
}

/// Prometheus metrics handle
pub struct MetricsHandle {
    handle: PrometheusHandle,
}

impl MetricsHandle {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
