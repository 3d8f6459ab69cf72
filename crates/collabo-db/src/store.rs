//! Storage traits consumed by the auth core
//!
//! The auth crate only ever talks to these traits. Uniqueness (email, and the
//! workspace/user pair) is the store's job: a duplicate insert must come back
//! as [`DbError::DuplicateEmail`] / [`DbError::DuplicateMembership`], which is
//! what callers treat as the authoritative conflict signal.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{
    NewUser, NewWorkspace, User, UserUpdate, Workspace, WorkspaceMembership, WorkspaceRole,
};

/// Durable user records keyed by id and unique email
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Insert a user; fails with `DuplicateEmail` if the email is taken
    async fn create(&self, user: NewUser) -> Result<User, DbError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, DbError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, DbError>;

    /// Apply a partial update; fails with `NotFound` for an unknown id
    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<User, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    /// Newest first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, DbError>;
}

/// Durable (workspace, user) -> role records, unique per pair
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a membership; fails with `DuplicateMembership` if the pair exists
    async fn create(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<WorkspaceMembership, DbError>;

    async fn delete(&self, workspace_id: Uuid, user_id: Uuid) -> Result<bool, DbError>;

    async fn get_by_workspace_and_user(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceMembership>, DbError>;

    /// Oldest member first
    async fn list_by_workspace(&self, workspace_id: Uuid)
    -> Result<Vec<WorkspaceMembership>, DbError>;

    async fn exists_by_workspace_and_user(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, DbError>;

    /// Returns `None` when the pair has no membership
    async fn update_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<Option<WorkspaceMembership>, DbError>;
}

/// Durable workspace records
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Insert a workspace and make its owner an `ADMIN` member, atomically
    async fn create(&self, workspace: NewWorkspace) -> Result<Workspace, DbError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Workspace>, DbError>;

    /// Workspaces the user is a member of, newest first
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Workspace>, DbError>;

    /// Memberships of the workspace go with it
    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;
}
