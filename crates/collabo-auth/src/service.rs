//! Registration, login and profile use cases

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use collabo_db::{NewUser, SystemRole, User, UserDirectory, UserUpdate};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::deadline::bounded;
use crate::error::{AuthError, ErrorKind};
use crate::guard::AuthenticatedIdentity;
use crate::jwt::TokenIssuer;
use crate::password::{HashingCost, hash_password, verify_password};
use crate::validation::{
    normalize_email, validate_avatar_url, validate_email, validate_name, validate_new_password,
};

/// Largest page `list_users` returns
pub const MAX_PAGE_SIZE: i64 = 100;

/// Public view of a user; never carries the password hash
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub system_role: SystemRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            system_role: user.system_role,
            created_at: user.created_at,
        }
    }
}

/// Result of a successful register or login
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    /// An empty string clears the avatar
    pub avatar_url: Option<String>,
}

/// Progress of a single registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegisterStage {
    Validating,
    CheckingUniqueness,
    Hashing,
    Persisting,
    IssuingToken,
    Done,
    Failed(ErrorKind),
}

impl RegisterStage {
    fn as_str(&self) -> &'static str {
        match self {
            RegisterStage::Validating => "validating",
            RegisterStage::CheckingUniqueness => "checking_uniqueness",
            RegisterStage::Hashing => "hashing",
            RegisterStage::Persisting => "persisting",
            RegisterStage::IssuingToken => "issuing_token",
            RegisterStage::Done => "done",
            RegisterStage::Failed(_) => "failed",
        }
    }

    fn advance(&mut self, next: RegisterStage) {
        debug!("Registration stage: {} -> {}", self.as_str(), next.as_str());
        *self = next;
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    issuer: Arc<TokenIssuer>,
    hashing: HashingCost,
    store_timeout: Duration,
    /// Verified against on unknown emails so both login failures cost the same
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        issuer: Arc<TokenIssuer>,
        config: &AuthConfig,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hash_password(&Uuid::new_v4().to_string(), config.hashing)?;
        Ok(Self {
            users,
            issuer,
            hashing: config.hashing,
            store_timeout: config.store_timeout,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Create an account and sign the new user in
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let mut stage = RegisterStage::Validating;
        debug!("Registration stage: {}", stage.as_str());
        let result = self.run_registration(&mut stage, email, name, password).await;
        match &result {
            Ok(session) => {
                stage.advance(RegisterStage::Done);
                info!("User registered: {}", session.user.id);
            }
            Err(e) => {
                debug!("Registration failed while {}: {}", stage.as_str(), e);
                stage.advance(RegisterStage::Failed(e.kind()));
            }
        }
        result
    }

    async fn run_registration(
        &self,
        stage: &mut RegisterStage,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        let name = validate_name(name)?;
        validate_new_password(password)?;

        // Fast path only; the store's unique constraint decides races
        stage.advance(RegisterStage::CheckingUniqueness);
        if bounded(
            self.store_timeout,
            "exists_by_email",
            self.users.exists_by_email(&email),
        )
        .await?
        {
            return Err(AuthError::EmailConflict);
        }

        stage.advance(RegisterStage::Hashing);
        let password_hash = self.hash(password).await?;

        stage.advance(RegisterStage::Persisting);
        let user = bounded(
            self.store_timeout,
            "create_user",
            self.users.create(NewUser {
                email,
                name,
                password_hash,
                avatar_url: None,
                system_role: SystemRole::User,
            }),
        )
        .await?;

        stage.advance(RegisterStage::IssuingToken);
        self.session_for(user)
    }

    /// Exchange credentials for a token
    ///
    /// Unknown email and wrong password both end in the same
    /// `InvalidCredentials` after the same amount of hashing work.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::Validation("email is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }

        let user = bounded(
            self.store_timeout,
            "get_user_by_email",
            self.users.get_by_email(&email),
        )
        .await?;

        let (stored_hash, user) = match user {
            Some(user) => (user.password_hash.clone(), Some(user)),
            None => (self.dummy_hash.to_string(), None),
        };
        let matches = self.verify(password, stored_hash).await?;

        let user = match user {
            Some(user) if matches => user,
            _ => {
                debug!("Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        info!("User logged in: {}", user.id);
        self.session_for(user)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, AuthError> {
        self.load_user(user_id).await.map(UserProfile::from)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AuthError> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let avatar_url = update
            .avatar_url
            .as_deref()
            .map(validate_avatar_url)
            .transpose()?;

        let user = self
            .apply_update(
                user_id,
                UserUpdate {
                    name,
                    avatar_url,
                    ..Default::default()
                },
            )
            .await?;

        info!("Profile updated: {}", user_id);
        Ok(user.into())
    }

    /// Replace the caller's password after re-checking the current one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(new_password)?;

        let user = self.load_user(user_id).await?;
        if !self.verify(current_password, user.password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.hash(new_password).await?;
        self.apply_update(
            user_id,
            UserUpdate {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?;

        info!("Password changed: {}", user_id);
        Ok(())
    }

    /// Page through all users; `SUPER_ADMIN` only
    pub async fn list_users(
        &self,
        identity: &AuthenticatedIdentity,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserProfile>, AuthError> {
        if !identity.system_role.is_super_admin() {
            return Err(AuthError::InsufficientPermissions);
        }
        let users = bounded(
            self.store_timeout,
            "list_users",
            self.users
                .list(limit.clamp(1, MAX_PAGE_SIZE), offset.max(0)),
        )
        .await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    /// Create a `SUPER_ADMIN` account unless one with this email exists
    ///
    /// An existing account that is not `SUPER_ADMIN` is an `EmailConflict`.
    pub async fn ensure_super_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        let name = validate_name(name)?;
        validate_new_password(password)?;

        if let Some(existing) = bounded(
            self.store_timeout,
            "get_user_by_email",
            self.users.get_by_email(&email),
        )
        .await?
        {
            if !existing.system_role.is_super_admin() {
                warn!("Bootstrap admin {} exists without SUPER_ADMIN", email);
                return Err(AuthError::EmailConflict);
            }
            return Ok(existing.into());
        }

        let password_hash = self.hash(password).await?;
        let user = bounded(
            self.store_timeout,
            "create_user",
            self.users.create(NewUser {
                email,
                name,
                password_hash,
                avatar_url: None,
                system_role: SystemRole::SuperAdmin,
            }),
        )
        .await?;

        info!("Created super admin: {}", user.email);
        Ok(user.into())
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AuthError> {
        let token = self.issuer.issue(user.id, user.system_role)?;
        Ok(AuthSession {
            user: user.into(),
            token,
            expires_in: self.issuer.ttl_secs(),
        })
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        bounded(self.store_timeout, "get_user", self.users.get_by_id(user_id))
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn apply_update(&self, user_id: Uuid, update: UserUpdate) -> Result<User, AuthError> {
        match bounded(
            self.store_timeout,
            "update_user",
            self.users.update(user_id, update),
        )
        .await
        {
            Err(AuthError::Database(collabo_db::DbError::NotFound(_))) => {
                Err(AuthError::UserNotFound)
            }
            other => other,
        }
    }

    async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let cost = self.hashing;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
    }

    async fn verify(&self, password: &str, hash: String) -> Result<bool, AuthError> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }
}
