//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidSystemRole(String),
    InvalidWorkspaceRole(String),
    InvalidId(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidSystemRole(s) => write!(f, "Invalid system role: {}", s),
            ParseError::InvalidWorkspaceRole(s) => write!(f, "Invalid workspace role: {}", s),
            ParseError::InvalidId(s) => write!(f, "Invalid id: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// Global privilege tier of a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemRole {
    User,
    SuperAdmin,
}

impl SystemRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemRole::User => "USER",
            SystemRole::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, SystemRole::SuperAdmin)
    }
}

impl FromStr for SystemRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(SystemRole::User),
            "SUPER_ADMIN" => Ok(SystemRole::SuperAdmin),
            _ => Err(ParseError::InvalidSystemRole(s.to_string())),
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Privilege tier within a single workspace
///
/// Ordered so that `Admin > Member`: an admin holds every member permission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkspaceRole {
    Member,
    Admin,
}

impl WorkspaceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceRole::Member => "MEMBER",
            WorkspaceRole::Admin => "ADMIN",
        }
    }

    /// Whether holding `self` grants the access level `required` asks for
    pub fn satisfies(&self, required: WorkspaceRole) -> bool {
        *self >= required
    }
}

impl FromStr for WorkspaceRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(WorkspaceRole::Admin),
            "MEMBER" => Ok(WorkspaceRole::Member),
            _ => Err(ParseError::InvalidWorkspaceRole(s.to_string())),
        }
    }
}

impl fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub system_role: SystemRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub system_role: SystemRole,
}

/// Partial user update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub avatar_url: Option<Option<String>>,
    pub password_hash: Option<String>,
}

/// Workspace model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New workspace (for insertion)
#[derive(Debug, Clone)]
pub struct NewWorkspace {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
}

/// A user's role inside one workspace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceMembership {
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: WorkspaceRole,
    pub joined_at: DateTime<Utc>,
}

// ==================== TryFrom Implementations ====================

fn decode_err(err: ParseError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

fn get_uuid(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|_| decode_err(ParseError::InvalidId(raw)))
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("system_role")?;
        Ok(User {
            id: get_uuid(row, "id")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            password_hash: row.try_get("password_hash")?,
            avatar_url: row.try_get("avatar_url")?,
            system_role: SystemRole::from_str(&role_str).map_err(decode_err)?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Workspace {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(Workspace {
            id: get_uuid(row, "id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            owner_id: get_uuid(row, "owner_id")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for WorkspaceMembership {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        Ok(WorkspaceMembership {
            workspace_id: get_uuid(row, "workspace_id")?,
            user_id: get_uuid(row, "user_id")?,
            role: WorkspaceRole::from_str(&role_str).map_err(decode_err)?,
            joined_at: parse_datetime_or_now(&row.try_get::<String, _>("joined_at")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_role_ordering() {
        assert!(WorkspaceRole::Admin.satisfies(WorkspaceRole::Admin));
        assert!(WorkspaceRole::Admin.satisfies(WorkspaceRole::Member));
        assert!(WorkspaceRole::Member.satisfies(WorkspaceRole::Member));
        assert!(!WorkspaceRole::Member.satisfies(WorkspaceRole::Admin));
    }

    #[test]
    fn test_role_strings() {
        assert_eq!("SUPER_ADMIN".parse::<SystemRole>().unwrap(), SystemRole::SuperAdmin);
        assert_eq!(SystemRole::User.as_str(), "USER");
        assert_eq!("MEMBER".parse::<WorkspaceRole>().unwrap(), WorkspaceRole::Member);
        assert!("admin".parse::<WorkspaceRole>().is_err());
        assert!("root".parse::<SystemRole>().is_err());

        assert_eq!(serde_json::to_string(&SystemRole::SuperAdmin).unwrap(), "\"SUPER_ADMIN\"");
        assert_eq!(serde_json::to_string(&WorkspaceRole::Admin).unwrap(), "\"ADMIN\"");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            password_hash: "secret-hash".to_string(),
            avatar_url: None,
            system_role: SystemRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["system_role"], "USER");
    }
}
