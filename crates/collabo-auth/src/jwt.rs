//! JWT token management

use std::time::Duration;

use chrono::{DateTime, Utc};
use collabo_db::SystemRole;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// System role at the time of issue
    pub role: SystemRole,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Signs and validates HS256 bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
    leeway_secs: i64,
}

fn whole_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

impl TokenIssuer {
    /// Create a new issuer
    pub fn new(secret: &str, ttl: Duration, leeway: Duration) -> Self {
        // Pinning the algorithm rejects `none` and every other alg header
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `validate_at`
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: whole_secs(ttl),
            leeway_secs: whole_secs(leeway),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl, config.leeway)
    }

    /// Lifetime of issued tokens in seconds
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for a user, valid from now
    pub fn issue(&self, user_id: Uuid, role: SystemRole) -> Result<String, AuthError> {
        self.issue_at(user_id, role, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        user_id: Uuid,
        role: SystemRole,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user_id,
            role,
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };

        debug!("Issuing token for user: {}", user_id);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate a token against the current time
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token against `now`
    ///
    /// The signature is checked before any claim is trusted. A token is live
    /// while `now < exp + leeway`.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!("Token rejected: {:?}", e.kind());
                AuthError::InvalidToken
            })?;

        let claims = token_data.claims;
        if now.timestamp() >= claims.exp.saturating_add(self.leeway_secs) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    const SECRET: &str = "test-secret-key";

    fn issuer(ttl_secs: u64) -> TokenIssuer {
        TokenIssuer::new(SECRET, Duration::from_secs(ttl_secs), Duration::ZERO)
    }

    #[test]
    fn test_token_issue_and_validation() {
        let issuer = issuer(3600);
        let user_id = Uuid::new_v4();

        let token = issuer.issue(user_id, SystemRole::SuperAdmin).unwrap();
        let claims = issuer.validate(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, SystemRole::SuperAdmin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expiry_boundary() {
        let issuer = issuer(60);
        let issued_at = Utc::now();
        let token = issuer.issue_at(Uuid::new_v4(), SystemRole::User, issued_at).unwrap();

        assert!(issuer.validate_at(&token, issued_at).is_ok());
        assert!(issuer
            .validate_at(&token, issued_at + TimeDelta::seconds(59))
            .is_ok());
        assert!(matches!(
            issuer.validate_at(&token, issued_at + TimeDelta::seconds(60)),
            Err(AuthError::TokenExpired)
        ));
        assert!(matches!(
            issuer.validate_at(&token, issued_at + TimeDelta::days(365)),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let issuer = issuer(0);
        let now = Utc::now();
        let token = issuer.issue_at(Uuid::new_v4(), SystemRole::User, now).unwrap();
        assert!(matches!(
            issuer.validate_at(&token, now),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_leeway_extends_acceptance() {
        let issuer = TokenIssuer::new(SECRET, Duration::from_secs(60), Duration::from_secs(30));
        let now = Utc::now();
        let token = issuer.issue_at(Uuid::new_v4(), SystemRole::User, now).unwrap();

        assert!(issuer.validate_at(&token, now + TimeDelta::seconds(89)).is_ok());
        assert!(matches!(
            issuer.validate_at(&token, now + TimeDelta::seconds(90)),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_any_altered_character_is_rejected() {
        let issuer = issuer(3600);
        let token = issuer.issue(Uuid::new_v4(), SystemRole::User).unwrap();

        for (i, c) in token.char_indices() {
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + c.len_utf8(), &replacement.to_string());
            assert!(
                matches!(issuer.validate(&tampered), Err(AuthError::InvalidToken)),
                "tampered token at byte {} was accepted",
                i
            );
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer(3600).issue(Uuid::new_v4(), SystemRole::User).unwrap();
        let other = TokenIssuer::new("another-secret", Duration::from_secs(3600), Duration::ZERO);
        assert!(matches!(other.validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_other_algorithms_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: SystemRole::SuperAdmin,
            iat: now,
            exp: now + 3600,
        };

        let hs512 = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            issuer(3600).validate(&hs512),
            Err(AuthError::InvalidToken)
        ));

        // {"alg":"none","typ":"JWT"} with the real payload and no signature
        let payload = hs512.split('.').nth(1).unwrap();
        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", payload);
        assert!(matches!(
            issuer(3600).validate(&unsigned),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let issuer = issuer(3600);
        for token in ["", "invalid-token", "a.b", "a.b.c", "...", "eyJhbGciOiJIUzI1NiJ9"] {
            assert!(
                matches!(issuer.validate(token), Err(AuthError::InvalidToken)),
                "{:?} was not rejected as invalid",
                token
            );
        }
    }

    #[test]
    fn test_claims_wire_format() {
        let claims = Claims {
            sub: Uuid::nil(),
            role: SystemRole::SuperAdmin,
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["role"], "SUPER_ADMIN");
        assert_eq!(json["iat"], 1);
        assert_eq!(json["exp"], 2);
    }
}
