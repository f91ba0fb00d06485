//! Token maintenance handlers (admin only)
//!
//! Cleanup is triggered from here or by an external scheduler.

use axum::extract::State;
use serde::Deserialize;
use yishan_service::dto::{CleanupResult, CleanupStats, HealthStatus, RevokeResponse};
use yishan_service::{AuthService, TokenCleanupService};

use crate::extractors::{AdminUser, ApiPath, ApiQuery};
use crate::response::{ApiJson, ApiResult};
use crate::state::AppState;

/// Query for token statistics
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    #[serde(default, alias = "user_id")]
    pub user_id: Option<i64>,
}

/// POST /api/v1/system/tokens/cleanup
pub async fn cleanup(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiJson<CleanupResult> {
    tracing::info!(admin_id = admin.user_id, "Token cleanup triggered");
    let result = TokenCleanupService::new(state.service_context())
        .execute_cleanup()
        .await;

    let message = if result.success {
        "Token cleanup completed"
    } else {
        "Token cleanup failed"
    };
    ApiJson::ok(result).with_message(message)
}

/// GET /api/v1/system/tokens/stats?userId=
pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> ApiResult<ApiJson<CleanupStats>> {
    let stats = TokenCleanupService::new(state.service_context())
        .get_stats(query.user_id)
        .await?;
    Ok(ApiJson::ok(stats))
}

/// GET /api/v1/system/tokens/health
pub async fn health(State(state): State<AppState>, _admin: AdminUser) -> ApiJson<HealthStatus> {
    let status = TokenCleanupService::new(state.service_context())
        .health_check()
        .await;
    ApiJson::ok(status)
}

/// Revoke every session of a user
///
/// POST /api/v1/system/tokens/revoke/:user_id
pub async fn revoke_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<ApiJson<RevokeResponse>> {
    tracing::info!(admin_id = admin.user_id, user_id, "Revoking all sessions of user");
    let revoked = AuthService::new(state.service_context())
        .revoke_user_sessions(user_id)
        .await?;
    Ok(ApiJson::ok(RevokeResponse::new(revoked)))
}
