//! Request/Response DTOs

use axum::Json;
use axum::http::StatusCode;
use collabo_db::WorkspaceRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==================== Envelope ====================

/// Success body shared by every endpoint
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn with_status(status: StatusCode, message: &str, data: T) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                success: true,
                status_code: status.as_u16(),
                message: message.to_string(),
                data: Some(data),
            }),
        )
    }

    pub fn ok(message: &str, data: T) -> (StatusCode, Json<Self>) {
        Self::with_status(StatusCode::OK, message, data)
    }
}

impl ApiResponse<()> {
    /// Success without a payload
    pub fn empty(message: &str) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                status_code: StatusCode::OK.as_u16(),
                message: message.to_string(),
                data: None,
            }),
        )
    }
}

// ==================== Auth Types ====================

/// Register request; the system role is never taken from the caller
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ==================== User Types ====================

/// Update profile request
#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Pagination for user listing
#[derive(Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

// ==================== Workspace Types ====================

#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    #[serde(default = "default_member_role")]
    pub role: WorkspaceRole,
}

fn default_member_role() -> WorkspaceRole {
    WorkspaceRole::Member
}

#[derive(Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: WorkspaceRole,
}
