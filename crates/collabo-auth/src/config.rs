//! Auth core configuration

use std::fmt;
use std::time::Duration;

use crate::password::HashingCost;

/// Default token lifetime: 24 hours
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default deadline for a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by the token issuer, the hasher and the services
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens
    pub jwt_secret: String,
    /// Lifetime of issued tokens
    pub token_ttl: Duration,
    /// Clock skew tolerated when checking expiry
    pub leeway: Duration,
    /// Work factors for new password hashes
    pub hashing: HashingCost,
    /// Upper bound on any single directory or membership call
    pub store_timeout: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            leeway: Duration::ZERO,
            hashing: HashingCost::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("leeway", &self.leeway)
            .field("hashing", &self.hashing)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::new("secret");
        assert_eq!(config.token_ttl, Duration::from_secs(86400));
        assert_eq!(config.leeway, Duration::ZERO);
        assert_eq!(config.hashing, HashingCost::default());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", AuthConfig::new("super-secret-value"));
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
