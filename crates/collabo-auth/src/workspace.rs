//! Workspace and membership use cases
//!
//! Every operation goes through [`AccessGuard`]: reading a workspace needs
//! `MEMBER`, changing its membership needs `ADMIN`. The owner's membership
//! cannot be removed or demoted, so a workspace always keeps an admin.

use std::sync::Arc;
use std::time::Duration;

use collabo_db::{
    MembershipStore, NewWorkspace, UserDirectory, Workspace, WorkspaceMembership, WorkspaceRole,
    WorkspaceStore,
};
use tracing::info;
use uuid::Uuid;

use crate::deadline::bounded;
use crate::error::AuthError;
use crate::guard::{AccessGuard, AuthenticatedIdentity};
use crate::validation::{validate_description, validate_workspace_name};

#[derive(Clone)]
pub struct WorkspaceService {
    workspaces: Arc<dyn WorkspaceStore>,
    memberships: Arc<dyn MembershipStore>,
    users: Arc<dyn UserDirectory>,
    guard: AccessGuard,
    store_timeout: Duration,
}

impl WorkspaceService {
    pub fn new(
        workspaces: Arc<dyn WorkspaceStore>,
        memberships: Arc<dyn MembershipStore>,
        users: Arc<dyn UserDirectory>,
        guard: AccessGuard,
        store_timeout: Duration,
    ) -> Self {
        Self {
            workspaces,
            memberships,
            users,
            guard,
            store_timeout,
        }
    }

    /// Create a workspace owned by the caller, who becomes its first `ADMIN`
    pub async fn create_workspace(
        &self,
        identity: &AuthenticatedIdentity,
        name: &str,
        description: Option<&str>,
    ) -> Result<Workspace, AuthError> {
        let name = validate_workspace_name(name)?;
        let description = validate_description(description)?;

        let workspace = bounded(
            self.store_timeout,
            "create_workspace",
            self.workspaces.create(NewWorkspace {
                name,
                description,
                owner_id: identity.user_id,
            }),
        )
        .await?;

        info!(
            "Workspace created: {} by {}",
            workspace.id, identity.user_id
        );
        Ok(workspace)
    }

    /// Workspaces the caller belongs to
    pub async fn list_workspaces(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> Result<Vec<Workspace>, AuthError> {
        bounded(
            self.store_timeout,
            "list_workspaces",
            self.workspaces.list_for_user(identity.user_id),
        )
        .await
    }

    pub async fn get_workspace(
        &self,
        identity: &AuthenticatedIdentity,
        workspace_id: Uuid,
    ) -> Result<Workspace, AuthError> {
        self.guard
            .require_workspace_role(identity, workspace_id, WorkspaceRole::Member)
            .await?;
        self.load_workspace(workspace_id).await
    }

    pub async fn list_members(
        &self,
        identity: &AuthenticatedIdentity,
        workspace_id: Uuid,
    ) -> Result<Vec<WorkspaceMembership>, AuthError> {
        self.guard
            .require_workspace_role(identity, workspace_id, WorkspaceRole::Member)
            .await?;
        bounded(
            self.store_timeout,
            "list_members",
            self.memberships.list_by_workspace(workspace_id),
        )
        .await
    }

    pub async fn add_member(
        &self,
        identity: &AuthenticatedIdentity,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<WorkspaceMembership, AuthError> {
        self.guard
            .require_workspace_role(identity, workspace_id, WorkspaceRole::Admin)
            .await?;

        bounded(self.store_timeout, "get_user", self.users.get_by_id(user_id))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let membership = bounded(
            self.store_timeout,
            "create_membership",
            self.memberships.create(workspace_id, user_id, role),
        )
        .await?;

        info!(
            "Added {} to workspace {} as {}",
            user_id, workspace_id, role
        );
        Ok(membership)
    }

    pub async fn change_member_role(
        &self,
        identity: &AuthenticatedIdentity,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<WorkspaceMembership, AuthError> {
        self.guard
            .require_workspace_role(identity, workspace_id, WorkspaceRole::Admin)
            .await?;

        let workspace = self.load_workspace(workspace_id).await?;
        if workspace.owner_id == user_id && role != WorkspaceRole::Admin {
            return Err(AuthError::Validation(
                "the workspace owner must remain an admin".to_string(),
            ));
        }

        let membership = bounded(
            self.store_timeout,
            "update_membership_role",
            self.memberships.update_role(workspace_id, user_id, role),
        )
        .await?
        .ok_or(AuthError::MemberNotFound)?;

        info!(
            "Changed role of {} in workspace {} to {}",
            user_id, workspace_id, role
        );
        Ok(membership)
    }

    pub async fn remove_member(
        &self,
        identity: &AuthenticatedIdentity,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AuthError> {
        self.guard
            .require_workspace_role(identity, workspace_id, WorkspaceRole::Admin)
            .await?;

        let workspace = self.load_workspace(workspace_id).await?;
        if workspace.owner_id == user_id {
            return Err(AuthError::Validation(
                "the workspace owner cannot be removed".to_string(),
            ));
        }

        let removed = bounded(
            self.store_timeout,
            "delete_membership",
            self.memberships.delete(workspace_id, user_id),
        )
        .await?;
        if !removed {
            return Err(AuthError::MemberNotFound);
        }

        info!("Removed {} from workspace {}", user_id, workspace_id);
        Ok(())
    }

    async fn load_workspace(&self, workspace_id: Uuid) -> Result<Workspace, AuthError> {
        bounded(
            self.store_timeout,
            "get_workspace",
            self.workspaces.get_by_id(workspace_id),
        )
        .await?
        .ok_or(AuthError::WorkspaceNotFound)
    }
}
