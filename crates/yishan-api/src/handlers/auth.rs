//! Authentication handlers
//!
//! Endpoints for login, logout, token refresh, the current user, and
//! password changes.

use axum::extract::State;
use yishan_service::dto::{
    ChangePasswordRequest, CurrentUserResponse, LoginRequest, LogoutRequest, RefreshTokenRequest,
    RevokeResponse, TokenPairResponse,
};
use yishan_service::AuthService;

use crate::extractors::{AuthUser, ClientInfo, OptionalJson, ValidatedJson};
use crate::response::{ApiJson, ApiResult};
use crate::state::AppState;

/// Login with username (or email) and password
///
/// POST /api/v1/login
pub async fn login(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<ApiJson<TokenPairResponse>> {
    let service = AuthService::new(state.service_context());
    let pair = service.login(request, client).await?;
    Ok(ApiJson::ok(pair).with_message("Login successful"))
}

/// Revoke the current session, or every session with `{"allDevices": true}`
///
/// POST /api/v1/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    OptionalJson(request): OptionalJson<LogoutRequest>,
) -> ApiResult<ApiJson<RevokeResponse>> {
    let service = AuthService::new(state.service_context());
    let revoked = if request.all_devices {
        service.logout(auth.user_id()).await?
    } else {
        u64::from(service.logout_session(auth.identity()).await?)
    };
    Ok(ApiJson::ok(RevokeResponse::new(revoked)).with_message("Logout successful"))
}

/// Exchange a refresh token for a new pair
///
/// POST /api/v1/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<ApiJson<TokenPairResponse>> {
    let service = AuthService::new(state.service_context());
    let pair = service.refresh(request, client).await?;
    Ok(ApiJson::ok(pair).with_message("Token refreshed"))
}

/// GET /api/v1/getCurrentUser
pub async fn get_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<ApiJson<CurrentUserResponse>> {
    let service = AuthService::new(state.service_context());
    let user = service.get_current_user(auth.identity()).await?;
    Ok(ApiJson::ok(user))
}

/// Change the caller's password; every session is revoked afterwards
///
/// POST /api/v1/changePassword
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<ApiJson<RevokeResponse>> {
    let service = AuthService::new(state.service_context());
    let revoked = service.change_password(auth.identity(), request).await?;
    Ok(ApiJson::ok(RevokeResponse::new(revoked)).with_message("Password changed"))
}
