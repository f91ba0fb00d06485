//! Authentication extractors
//!
//! Resolves the caller from the `Authorization: Bearer <token>` header. The
//! scheme is matched exactly; `bearer` or `BEARER` are rejected.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use yishan_service::{AuthService, Identity};

use crate::response::ApiError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the raw token out of the request headers
fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::MissingAuth)?
        .to_str()
        .map_err(|_| ApiError::InvalidAuthFormat)?;

    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::InvalidAuthFormat)
}

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }

    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let app_state = AppState::from_ref(state);
        let identity = AuthService::new(app_state.service_context())
            .validate_access_token(token)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected");
                ApiError::from(e)
            })?;

        Ok(AuthUser(identity))
    }
}

/// Authenticated caller holding the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;

        if !identity.is_admin() {
            tracing::warn!(user_id = identity.user_id, "Non-admin attempted an admin operation");
            return Err(ApiError::Forbidden);
        }

        Ok(AdminUser(identity))
    }
}
