//! Request extractors

use axum::{
    Json,
    extract::{FromRef, FromRequest, FromRequestParts, Query, Request},
    http::{header::AUTHORIZATION, request::Parts},
};
use collabo_auth::{AuthError, AuthenticatedIdentity};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::state::AppState;

// ==================== Auth Extractors ====================

/// Extractor for the authenticated caller (required)
pub struct RequireAuth(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|h| h.to_str().map_err(|_| AuthError::InvalidAuthHeader))
            .transpose()?;

        let identity = app_state.guard.authenticate(header)?;
        Ok(RequireAuth(identity))
    }
}

// ==================== Body and Query Extractors ====================

/// `Json` whose rejection is reported in the API error envelope
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// `Query` whose rejection is reported in the API error envelope
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}
