//! Registration and login routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use collabo_auth::{AuthError, AuthSession};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

use super::extract::ApiJson;
use super::types::{ApiResponse, LoginRequest, RegisterRequest};

/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthSession>>), ApiError> {
    debug!("Registration attempt");

    let session = state
        .auth
        .register(&request.email, &request.name, &request.password)
        .await?;

    metrics::counter!("collabo_auth_registrations_total").increment(1);

    Ok(ApiResponse::with_status(
        StatusCode::CREATED,
        "User registered successfully",
        session,
    ))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthSession>>), ApiError> {
    match state.auth.login(&request.email, &request.password).await {
        Ok(session) => {
            metrics::counter!("collabo_auth_logins_total", "outcome" => "success").increment(1);
            Ok(ApiResponse::ok("Login successful", session))
        }
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                warn!("Failed login attempt");
                metrics::counter!("collabo_auth_logins_total", "outcome" => "rejected")
                    .increment(1);
            } else {
                metrics::counter!("collabo_auth_logins_total", "outcome" => "error").increment(1);
            }
            Err(e.into())
        }
    }
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}
