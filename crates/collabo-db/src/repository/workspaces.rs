//! Workspace operations

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewWorkspace, Workspace, WorkspaceRole};
use crate::repository::Database;
use crate::store::WorkspaceStore;

#[async_trait]
impl WorkspaceStore for Database {
    async fn create(&self, workspace: NewWorkspace) -> Result<Workspace, DbError> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO workspaces (id, name, description, owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&workspace.name)
        .bind(&workspace.description)
        .bind(workspace.owner_id.to_string())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO workspace_members (workspace_id, user_id, role, joined_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(workspace.owner_id.to_string())
        .bind(WorkspaceRole::Admin.as_str())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Workspace {
            id,
            name: workspace.name,
            description: workspace.description,
            owner_id: workspace.owner_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Workspace>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, description, owner_id, created_at, updated_at
            FROM workspaces
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Workspace::try_from(&row).map_err(DbError::from)).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Workspace>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT w.id, w.name, w.description, w.owner_id, w.created_at, w.updated_at
            FROM workspaces w
            INNER JOIN workspace_members wm ON w.id = wm.workspace_id
            WHERE wm.user_id = ?
            ORDER BY w.created_at DESC
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Workspace::try_from(row).map_err(DbError::from))
            .collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM workspaces WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, SystemRole};
    use crate::store::{MembershipStore, UserDirectory};

    #[tokio::test]
    async fn test_create_workspace_makes_owner_admin() {
        let db = Database::in_memory().await.unwrap();
        let owner = UserDirectory::create(
            &db,
            NewUser {
                email: "owner@example.com".to_string(),
                name: "Owner".to_string(),
                password_hash: "hash".to_string(),
                avatar_url: None,
                system_role: SystemRole::User,
            },
        )
        .await
        .unwrap();

        let workspace = WorkspaceStore::create(
            &db,
            NewWorkspace {
                name: "Platform".to_string(),
                description: Some("Platform team".to_string()),
                owner_id: owner.id,
            },
        )
        .await
        .unwrap();

        let membership = db
            .get_by_workspace_and_user(workspace.id, owner.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(membership.role, WorkspaceRole::Admin);

        let listed = db.list_for_user(owner.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Platform");

        assert!(WorkspaceStore::delete(&db, workspace.id).await.unwrap());
        assert!(WorkspaceStore::get_by_id(&db, workspace.id).await.unwrap().is_none());
        assert!(db.list_by_workspace(workspace.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_workspace_for_unknown_owner_fails() {
        let db = Database::in_memory().await.unwrap();
        let result = WorkspaceStore::create(
            &db,
            NewWorkspace {
                name: "Ghost".to_string(),
                description: None,
                owner_id: Uuid::new_v4(),
            },
        )
        .await;
        assert!(result.is_err());
    }
}
