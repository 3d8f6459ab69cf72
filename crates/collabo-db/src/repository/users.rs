//! User operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewUser, User, UserUpdate};
use crate::repository::Database;
use crate::store::UserDirectory;

const USER_COLUMNS: &str =
    "id, email, name, password_hash, avatar_url, system_role, created_at, updated_at";

#[async_trait]
impl UserDirectory for Database {
    async fn create(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        // No pre-check here: the UNIQUE constraint is the only authority
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, avatar_url, system_role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(user.system_role.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if DbError::is_unique_violation(&e) {
                DbError::DuplicateEmail(user.email.clone())
            } else {
                DbError::from(e)
            }
        })?;

        Ok(User {
            id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            avatar_url: user.avatar_url,
            system_role: user.system_role,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?) as found")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        let found: i64 = result.get("found");
        Ok(found != 0)
    }

    async fn update(&self, id: Uuid, update: UserUpdate) -> Result<User, DbError> {
        let now = Utc::now();
        let (avatar_set, avatar_value) = match update.avatar_url {
            Some(value) => (true, value),
            None => (false, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                avatar_url = CASE WHEN ? THEN ? ELSE avatar_url END,
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(avatar_set)
        .bind(avatar_value)
        .bind(&update.password_hash)
        .bind(now.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User: {}", id)));
        }

        UserDirectory::get_by_id(self, id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("User: {}", id)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SystemRole;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Test User".to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            avatar_url: None,
            system_role: SystemRole::User,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let db = Database::in_memory().await.unwrap();

        let user = UserDirectory::create(&db, new_user("alice@example.com")).await.unwrap();
        assert_eq!(user.system_role, SystemRole::User);

        let by_email = db.get_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.password_hash, "$argon2id$placeholder");

        let by_id = UserDirectory::get_by_id(&db, user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");

        assert!(db.exists_by_email("alice@example.com").await.unwrap());
        assert!(!db.exists_by_email("bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_by_store() {
        let db = Database::in_memory().await.unwrap();

        UserDirectory::create(&db, new_user("dup@example.com")).await.unwrap();
        let err = UserDirectory::create(&db, new_user("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateEmail(email) if email == "dup@example.com"));
    }

    #[tokio::test]
    async fn test_update_user() {
        let db = Database::in_memory().await.unwrap();
        let user = UserDirectory::create(&db, new_user("carol@example.com")).await.unwrap();

        let updated = db
            .update(
                user.id,
                UserUpdate {
                    name: Some("Carol".to_string()),
                    avatar_url: Some(Some("https://cdn.example.com/c.png".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Carol");
        assert_eq!(updated.avatar_url.as_deref(), Some("https://cdn.example.com/c.png"));
        assert_eq!(updated.email, "carol@example.com");

        let cleared = db
            .update(
                user.id,
                UserUpdate {
                    avatar_url: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.avatar_url.is_none());
        assert_eq!(cleared.name, "Carol");

        let missing = db.update(Uuid::new_v4(), UserUpdate::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_and_delete_users() {
        let db = Database::in_memory().await.unwrap();
        let a = UserDirectory::create(&db, new_user("a@example.com")).await.unwrap();
        UserDirectory::create(&db, new_user("b@example.com")).await.unwrap();

        assert_eq!(db.list(10, 0).await.unwrap().len(), 2);
        assert_eq!(db.list(1, 0).await.unwrap().len(), 1);
        assert_eq!(db.list(10, 2).await.unwrap().len(), 0);

        assert!(UserDirectory::delete(&db, a.id).await.unwrap());
        assert!(!UserDirectory::delete(&db, a.id).await.unwrap());
        assert_eq!(db.list(10, 0).await.unwrap().len(), 1);
    }
}
