//! Request authentication and workspace authorization
//!
//! [`AccessGuard::authenticate`] turns an `Authorization` header into an
//! [`AuthenticatedIdentity`] value that handlers receive directly. Workspace
//! checks then compare the caller's membership role against what the
//! operation requires, so an `ADMIN` passes every `MEMBER` check.

use std::sync::Arc;
use std::time::Duration;

use collabo_db::{MembershipStore, SystemRole, WorkspaceMembership, WorkspaceRole};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::deadline::bounded;
use crate::error::AuthError;
use crate::jwt::{Claims, TokenIssuer};

/// The caller behind a validated bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    pub user_id: Uuid,
    pub system_role: SystemRole,
}

impl AuthenticatedIdentity {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            system_role: claims.role,
        }
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

#[derive(Clone)]
pub struct AccessGuard {
    issuer: Arc<TokenIssuer>,
    memberships: Arc<dyn MembershipStore>,
    store_timeout: Duration,
}

impl AccessGuard {
    pub fn new(
        issuer: Arc<TokenIssuer>,
        memberships: Arc<dyn MembershipStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            issuer,
            memberships,
            store_timeout,
        }
    }

    /// Resolve the raw `Authorization` header value into an identity
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthenticatedIdentity, AuthError> {
        let header = header.ok_or(AuthError::MissingAuthHeader)?;
        let token = extract_bearer_token(header)?;
        let claims = self.issuer.validate(token)?;
        let identity = AuthenticatedIdentity::from_claims(&claims);

        debug!(
            "Authenticated user: {} ({})",
            identity.user_id,
            identity.system_role.as_str()
        );

        Ok(identity)
    }

    /// Whether the caller's role in the workspace meets `required`
    ///
    /// Fails with `MembershipNotFound` when the caller is not a member at all.
    pub async fn authorize_workspace_role(
        &self,
        identity: &AuthenticatedIdentity,
        workspace_id: Uuid,
        required: WorkspaceRole,
    ) -> Result<bool, AuthError> {
        let membership = self.membership(identity, workspace_id).await?;
        Ok(membership.role.satisfies(required))
    }

    /// Like [`authorize_workspace_role`](Self::authorize_workspace_role) but
    /// an insufficient role is an error and the membership is returned
    pub async fn require_workspace_role(
        &self,
        identity: &AuthenticatedIdentity,
        workspace_id: Uuid,
        required: WorkspaceRole,
    ) -> Result<WorkspaceMembership, AuthError> {
        let membership = self.membership(identity, workspace_id).await?;
        if !membership.role.satisfies(required) {
            debug!(
                "User {} has {} in workspace {}, {} required",
                identity.user_id, membership.role, workspace_id, required
            );
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(membership)
    }

    pub fn require_super_admin(&self, identity: &AuthenticatedIdentity) -> Result<(), AuthError> {
        if !identity.system_role.is_super_admin() {
            return Err(AuthError::InsufficientPermissions);
        }
        Ok(())
    }

    async fn membership(
        &self,
        identity: &AuthenticatedIdentity,
        workspace_id: Uuid,
    ) -> Result<WorkspaceMembership, AuthError> {
        bounded(
            self.store_timeout,
            "get_membership",
            self.memberships
                .get_by_workspace_and_user(workspace_id, identity.user_id),
        )
        .await?
        .ok_or(AuthError::MembershipNotFound)
    }
}
