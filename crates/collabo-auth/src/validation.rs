//! Input normalization and validation

use std::sync::LazyLock;

use regex::Regex;

use crate::error::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MIN_WORKSPACE_NAME_LENGTH: usize = 2;
pub const MAX_WORKSPACE_NAME_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_AVATAR_URL_LENGTH: usize = 2048;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Canonical form of an email: surrounding whitespace removed, lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check an already-normalized email
pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if email.is_empty() {
        return Err(AuthError::Validation("email is required".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH || !EMAIL_RE.is_match(email) {
        return Err(AuthError::Validation("email is not valid".to_string()));
    }
    Ok(())
}

/// Trim a display name and check it is present and not too long
pub fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::Validation("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "name must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

/// Password policy for new passwords
pub fn validate_new_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_workspace_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    let len = name.chars().count();
    if !(MIN_WORKSPACE_NAME_LENGTH..=MAX_WORKSPACE_NAME_LENGTH).contains(&len) {
        return Err(AuthError::Validation(format!(
            "workspace name must be between {} and {} characters",
            MIN_WORKSPACE_NAME_LENGTH, MAX_WORKSPACE_NAME_LENGTH
        )));
    }
    Ok(name.to_string())
}

/// Trimmed description; blank becomes `None`
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, AuthError> {
    let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(AuthError::Validation(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(Some(description.to_string()))
}

/// Trimmed avatar URL; blank clears the avatar
pub fn validate_avatar_url(url: &str) -> Result<Option<String>, AuthError> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(None);
    }
    if url.len() > MAX_AVATAR_URL_LENGTH
        || !(url.starts_with("https://") || url.starts_with("http://"))
    {
        return Err(AuthError::Validation("avatar_url must be an http(s) URL".to_string()));
    }
    Ok(Some(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("bob@example.com"), "bob@example.com");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co").is_ok());

        for bad in ["", "alice", "alice@", "@example.com", "alice@example", "a b@example.com"] {
            assert!(
                matches!(validate_email(bad), Err(AuthError::Validation(_))),
                "{:?} accepted",
                bad
            );
        }
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Alice ").unwrap(), "Alice");
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("1234567").is_err());
        assert!(validate_new_password("12345678").is_ok());
        assert!(validate_new_password("").is_err());
    }

    #[test]
    fn test_workspace_fields() {
        assert_eq!(validate_workspace_name(" Platform ").unwrap(), "Platform");
        assert!(validate_workspace_name("x").is_err());
        assert_eq!(validate_description(Some("  ")).unwrap(), None);
        assert_eq!(validate_description(None).unwrap(), None);
        assert_eq!(
            validate_description(Some(" team ")).unwrap().as_deref(),
            Some("team")
        );
        assert!(validate_description(Some(&"d".repeat(MAX_DESCRIPTION_LENGTH + 1))).is_err());
    }

    #[test]
    fn test_validate_avatar_url() {
        assert_eq!(validate_avatar_url("").unwrap(), None);
        assert_eq!(
            validate_avatar_url(" https://cdn.example.com/a.png ").unwrap().as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert!(validate_avatar_url("javascript:alert(1)").is_err());
    }
}
