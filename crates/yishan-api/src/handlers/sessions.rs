//! Session handlers
//!
//! A session is one issued token pair of the caller.

use axum::extract::State;
use yishan_service::dto::{RevokeResponse, SessionResponse};
use yishan_service::AuthService;

use crate::extractors::{ApiPath, AuthUser, PageQuery};
use crate::response::{ApiJson, ApiResult};
use crate::state::AppState;

/// Active sessions of the caller, newest first
///
/// GET /api/v1/sessions?page=&pageSize=
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    page: PageQuery,
) -> ApiResult<ApiJson<Vec<SessionResponse>>> {
    let service = AuthService::new(state.service_context());
    let (sessions, total) = service
        .list_sessions(auth.identity(), page.page, page.page_size)
        .await?;
    Ok(ApiJson::page(sessions, page.page, page.page_size, total))
}

/// Revoke one of the caller's sessions
///
/// DELETE /api/v1/sessions/:session_id
pub async fn revoke_session(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(session_id): ApiPath<i64>,
) -> ApiResult<ApiJson<RevokeResponse>> {
    let service = AuthService::new(state.service_context());
    let revoked = service.revoke_session(auth.identity(), session_id).await?;
    Ok(ApiJson::ok(RevokeResponse::new(u64::from(revoked))))
}
