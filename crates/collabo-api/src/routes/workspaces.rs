//! Workspace and membership routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use collabo_db::{Workspace, WorkspaceMembership};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

use super::extract::{ApiJson, RequireAuth};
use super::types::{AddMemberRequest, ApiResponse, CreateWorkspaceRequest, UpdateMemberRoleRequest};

// ==================== Workspace Routes ====================

/// POST /workspaces
async fn create_workspace(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Workspace>>), ApiError> {
    let workspace = state
        .workspaces
        .create_workspace(&identity, &request.name, request.description.as_deref())
        .await?;
    Ok(ApiResponse::with_status(
        StatusCode::CREATED,
        "Workspace created successfully",
        workspace,
    ))
}

/// GET /workspaces
async fn list_workspaces(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<Workspace>>>), ApiError> {
    let workspaces = state.workspaces.list_workspaces(&identity).await?;
    Ok(ApiResponse::ok("Workspaces retrieved successfully", workspaces))
}

/// GET /workspaces/{id}
async fn get_workspace(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Workspace>>), ApiError> {
    let workspace = state
        .workspaces
        .get_workspace(&identity, workspace_id)
        .await?;
    Ok(ApiResponse::ok("Workspace retrieved successfully", workspace))
}

// ==================== Member Routes ====================

/// GET /workspaces/{id}/members
async fn list_members(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<WorkspaceMembership>>>), ApiError> {
    let members = state
        .workspaces
        .list_members(&identity, workspace_id)
        .await?;
    Ok(ApiResponse::ok("Members retrieved successfully", members))
}

/// POST /workspaces/{id}/members
async fn add_member(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    ApiJson(request): ApiJson<AddMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WorkspaceMembership>>), ApiError> {
    let membership = state
        .workspaces
        .add_member(&identity, workspace_id, request.user_id, request.role)
        .await?;
    Ok(ApiResponse::with_status(
        StatusCode::CREATED,
        "Member added successfully",
        membership,
    ))
}

/// PUT /workspaces/{id}/members/{user_id}
async fn change_member_role(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path((workspace_id, user_id)): Path<(Uuid, Uuid)>,
    ApiJson(request): ApiJson<UpdateMemberRoleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WorkspaceMembership>>), ApiError> {
    let membership = state
        .workspaces
        .change_member_role(&identity, workspace_id, user_id, request.role)
        .await?;
    Ok(ApiResponse::ok("Member role updated successfully", membership))
}

/// DELETE /workspaces/{id}/members/{user_id}
async fn remove_member(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    Path((workspace_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    state
        .workspaces
        .remove_member(&identity, workspace_id, user_id)
        .await?;
    Ok(ApiResponse::empty("Member removed successfully"))
}

/// Create workspace routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/workspaces", get(list_workspaces).post(create_workspace))
        .route("/workspaces/{id}", get(get_workspace))
        .route("/workspaces/{id}/members", get(list_members).post(add_member))
        .route(
            "/workspaces/{id}/members/{user_id}",
            put(change_member_role).delete(remove_member),
        )
}
