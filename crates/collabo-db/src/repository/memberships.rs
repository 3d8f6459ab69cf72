//! Workspace membership operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{WorkspaceMembership, WorkspaceRole};
use crate::repository::Database;
use crate::store::MembershipStore;

#[async_trait]
impl MembershipStore for Database {
    async fn create(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<WorkspaceMembership, DbError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO workspace_members (workspace_id, user_id, role, joined_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(workspace_id.to_string())
        .bind(user_id.to_string())
        .bind(role.as_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if DbError::is_unique_violation(&e) {
                DbError::DuplicateMembership {
                    workspace_id,
                    user_id,
                }
            } else {
                DbError::from(e)
            }
        })?;

        Ok(WorkspaceMembership {
            workspace_id,
            user_id,
            role,
            joined_at: now,
        })
    }

    async fn delete(&self, workspace_id: Uuid, user_id: Uuid) -> Result<bool, DbError> {
        let result =
            sqlx::query("DELETE FROM workspace_members WHERE workspace_id = ? AND user_id = ?")
                .bind(workspace_id.to_string())
                .bind(user_id.to_string())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_by_workspace_and_user(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceMembership>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT workspace_id, user_id, role, joined_at
            FROM workspace_members
            WHERE workspace_id = ? AND user_id = ?
            "#,
        )
        .bind(workspace_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| WorkspaceMembership::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    async fn list_by_workspace(
        &self,
        workspace_id: Uuid,
    ) -> Result<Vec<WorkspaceMembership>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT workspace_id, user_id, role, joined_at
            FROM workspace_members
            WHERE workspace_id = ?
            ORDER BY joined_at ASC
            "#,
        )
        .bind(workspace_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| WorkspaceMembership::try_from(row).map_err(DbError::from))
            .collect()
    }

    async fn exists_by_workspace_and_user(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM workspace_members WHERE workspace_id = ? AND user_id = ?
            ) as found
            "#,
        )
        .bind(workspace_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        let found: i64 = result.get("found");
        Ok(found != 0)
    }

    async fn update_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        role: WorkspaceRole,
    ) -> Result<Option<WorkspaceMembership>, DbError> {
        let result = sqlx::query(
            "UPDATE workspace_members SET role = ? WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(role.as_str())
        .bind(workspace_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_workspace_and_user(workspace_id, user_id).await
    }
}
