//! Profile and user listing routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use collabo_auth::{ProfileUpdate, UserProfile};

use crate::error::ApiError;
use crate::state::AppState;

use super::extract::{ApiJson, ApiQuery, RequireAuth};
use super::types::{ApiResponse, ChangePasswordRequest, ListUsersQuery, UpdateProfileRequest};

/// GET /user/profile
async fn get_profile(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), ApiError> {
    let profile = state.auth.get_profile(identity.user_id).await?;
    Ok(ApiResponse::ok("Profile retrieved successfully", profile))
}

/// PUT /user/profile
async fn update_profile(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), ApiError> {
    let profile = state
        .auth
        .update_profile(
            identity.user_id,
            ProfileUpdate {
                name: request.name,
                avatar_url: request.avatar_url,
            },
        )
        .await?;
    Ok(ApiResponse::ok("Profile updated successfully", profile))
}

/// PUT /user/password
async fn change_password(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    state
        .auth
        .change_password(
            identity.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await?;
    Ok(ApiResponse::empty("Password changed successfully"))
}

/// GET /users (SUPER_ADMIN only)
async fn list_users(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<UserProfile>>>), ApiError> {
    let users = state
        .auth
        .list_users(&identity, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok("Users retrieved successfully", users))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/user/password", put(change_password))
        .route("/users", get(list_users))
}
