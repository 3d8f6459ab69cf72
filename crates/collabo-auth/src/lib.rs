//! Collabo Authentication
//!
//! This crate provides the identity and access-control core: password
//! hashing, token issuing, registration/login and workspace role checks.
//! It depends only on the storage traits from `collabo-db`.

pub mod config;
mod deadline;
pub mod error;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod service;
pub mod validation;
pub mod workspace;

pub use config::AuthConfig;
pub use error::{AuthError, ErrorKind};
pub use guard::{AccessGuard, AuthenticatedIdentity, extract_bearer_token};
pub use jwt::{Claims, TokenIssuer};
pub use password::{HashingCost, hash_password, verify_password};
pub use service::{AuthService, AuthSession, ProfileUpdate, UserProfile};
pub use workspace::WorkspaceService;
