//! Authentication service
//!
//! Handles login, access token validation, refresh rotation, logout, password
//! changes, and session management.
//!
//! A session moves through `ACTIVE -> ACCESS_EXPIRED -> TERMINATED`. Every
//! validation goes back to the token store and the user record, so a revoked
//! pair or a disabled account is rejected even while the JWT itself is still
//! within its lifetime.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use yishan_common::auth::validate_password_strength;
use yishan_common::{AppError, BootstrapAdminConfig};
use yishan_core::entities::{NewAuthToken, NewUser, RotateOutcome, User, UserRole, UserStatus};

use crate::dto::{
    ChangePasswordRequest, ClientMeta, CurrentUserResponse, LoginRequest, RefreshTokenRequest,
    SessionResponse, TokenPairResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Caller resolved from a valid access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: UserRole,
    /// Token pair the request was authenticated with
    pub session_id: i64,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Login with username or email and password
    ///
    /// Unknown accounts and wrong passwords fail identically, including the
    /// scrypt work done. Account status is only revealed once the password
    /// has been verified.
    #[instrument(skip(self, request, client), fields(identifier = %request.username, ip = ?client.ip))]
    pub async fn login(&self, request: LoginRequest, client: ClientMeta) -> ServiceResult<TokenPairResponse> {
        let identifier = request.username.trim();
        let users = self.ctx.user_repo();
        let passwords = self.ctx.password_service();

        let Some(user) = users.find_by_identifier(identifier).await? else {
            passwords.verify_dummy_blocking(request.password).await?;
            warn!("Login failed: unknown identifier");
            return Err(AppError::InvalidCredentials.into());
        };

        let Some(password_hash) = users.get_password_hash(user.id).await? else {
            passwords.verify_dummy_blocking(request.password).await?;
            warn!(user_id = user.id, "Login failed: no password hash");
            return Err(AppError::InvalidCredentials.into());
        };

        if !passwords.verify_blocking(request.password, password_hash).await? {
            warn!(user_id = user.id, "Login failed: invalid password");
            return Err(AppError::InvalidCredentials.into());
        }

        ensure_can_authenticate(&user)?;

        let now = self.ctx.now();
        let pair = self.new_pair(user.id, &client, now)?;
        let token = self.ctx.token_repo().create(pair, now).await?;
        users.record_login(user.id, now, client.ip.as_deref()).await?;

        info!(user_id = user.id, session_id = token.id, "User logged in successfully");

        Ok(TokenPairResponse::from_token(&token, now))
    }

    /// Resolve an access token to the calling identity
    #[instrument(skip(self, token))]
    pub async fn validate_access_token(&self, token: &str) -> ServiceResult<Identity> {
        let now = self.ctx.now();
        let claims = self.ctx.jwt_service().validate_access_token(token, now)?;
        let user_id = claims.user_id()?;

        let session = self
            .ctx
            .token_repo()
            .find_active_by_access_token(token, now)
            .await?
            .ok_or_else(|| {
                debug!(user_id, "Access token not active in store");
                ServiceError::App(AppError::TokenRevoked)
            })?;

        if session.user_id != user_id {
            warn!(user_id, session_id = session.id, "Token subject does not match stored owner");
            return Err(AppError::InvalidToken.into());
        }

        let user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::App(AppError::InvalidToken))?;

        ensure_can_authenticate(&user)?;

        Ok(Identity {
            user_id,
            username: user.username,
            role: user.role,
            session_id: session.id,
        })
    }

    /// Rotate a refresh token into a brand-new pair
    ///
    /// The consumed pair is revoked in the same write that stores the new
    /// one. Presenting a refresh token that was already exchanged is treated
    /// as theft: every session of that user is revoked. A pair revoked by
    /// logout or an administrator just fails with `TokenRevoked`.
    #[instrument(skip(self, request, client))]
    pub async fn refresh(&self, request: RefreshTokenRequest, client: ClientMeta) -> ServiceResult<TokenPairResponse> {
        let now = self.ctx.now();
        let claims = self
            .ctx
            .jwt_service()
            .validate_refresh_token(&request.refresh_token, now)?;
        let user_id = claims.user_id()?;

        let tokens = self.ctx.token_repo();
        let session = tokens
            .find_by_refresh_token(&request.refresh_token)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or(ServiceError::App(AppError::InvalidToken))?;

        if session.was_rotated() {
            let revoked = tokens.revoke_all_for_user(user_id, now).await?;
            warn!(user_id, session_id = session.id, revoked, "Refresh token replay detected, all sessions revoked");
            return Err(AppError::TokenRevoked.into());
        }
        if session.is_revoked {
            return Err(AppError::TokenRevoked.into());
        }

        if !session.is_refresh_active(now) {
            return Err(AppError::TokenExpired.into());
        }

        let user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::App(AppError::InvalidToken))?;
        ensure_can_authenticate(&user)?;

        let pair = self.new_pair(user_id, &client, now)?;
        match tokens.rotate(session.id, pair, now).await? {
            RotateOutcome::Rotated(token) => {
                info!(user_id, old_session_id = session.id, session_id = token.id, "Tokens refreshed successfully");
                Ok(TokenPairResponse::from_token(&token, now))
            }
            RotateOutcome::AlreadyRevoked => {
                // Lost a race: only a competing refresh counts as replay
                let rotated = tokens
                    .find_by_id(session.id)
                    .await?
                    .is_some_and(|s| s.was_rotated());
                if rotated {
                    let revoked = tokens.revoke_all_for_user(user_id, now).await?;
                    warn!(user_id, session_id = session.id, revoked, "Concurrent refresh detected, all sessions revoked");
                }
                Err(AppError::TokenRevoked.into())
            }
        }
    }

    /// Logout everywhere: revoke every session of the user
    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: i64) -> ServiceResult<u64> {
        let revoked = self
            .ctx
            .token_repo()
            .revoke_all_for_user(user_id, self.ctx.now())
            .await?;

        info!(user_id, revoked, "User logged out of all sessions");
        Ok(revoked)
    }

    /// Logout the session the caller authenticated with
    #[instrument(skip(self, identity), fields(user_id = identity.user_id, session_id = identity.session_id))]
    pub async fn logout_session(&self, identity: &Identity) -> ServiceResult<bool> {
        let revoked = self
            .ctx
            .token_repo()
            .revoke(identity.session_id, self.ctx.now())
            .await?;

        info!("User logged out successfully");
        Ok(revoked)
    }

    /// Change the caller's password and revoke all their sessions
    #[instrument(skip(self, identity, request), fields(user_id = identity.user_id))]
    pub async fn change_password(&self, identity: &Identity, request: ChangePasswordRequest) -> ServiceResult<u64> {
        validate_password_strength(&request.new_password)?;

        let users = self.ctx.user_repo();
        let passwords = self.ctx.password_service();

        let current_hash = users
            .get_password_hash(identity.user_id)
            .await?
            .ok_or(ServiceError::App(AppError::UserNotFound))?;

        let unchanged = request.old_password == request.new_password;
        if !passwords.verify_blocking(request.old_password, current_hash).await? {
            warn!("Password change failed: current password mismatch");
            return Err(AppError::PasswordMismatch.into());
        }
        if unchanged {
            return Err(AppError::OperationNotAllowed(
                "New password must differ from the current password".to_string(),
            )
            .into());
        }

        let new_hash = passwords.hash_blocking(request.new_password).await?;
        let now = self.ctx.now();
        users.update_password(identity.user_id, &new_hash, now).await?;
        let revoked = self
            .ctx
            .token_repo()
            .revoke_all_for_user(identity.user_id, now)
            .await?;

        info!(revoked, "Password changed, sessions revoked");
        Ok(revoked)
    }

    /// Page of the caller's active sessions, newest first, with the total count
    #[instrument(skip(self, identity), fields(user_id = identity.user_id))]
    pub async fn list_sessions(
        &self,
        identity: &Identity,
        page: u32,
        page_size: u32,
    ) -> ServiceResult<(Vec<SessionResponse>, u64)> {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        let (tokens, total) = self
            .ctx
            .token_repo()
            .list_active_for_user(identity.user_id, self.ctx.now(), offset, u64::from(page_size))
            .await?;

        let sessions = tokens
            .iter()
            .map(|token| SessionResponse {
                current: token.id == identity.session_id,
                ..SessionResponse::from(token)
            })
            .collect();

        Ok((sessions, total))
    }

    /// Revoke one of the caller's own sessions
    ///
    /// Sessions belonging to someone else are reported as not found.
    #[instrument(skip(self, identity), fields(user_id = identity.user_id))]
    pub async fn revoke_session(&self, identity: &Identity, session_id: i64) -> ServiceResult<bool> {
        let tokens = self.ctx.token_repo();

        tokens
            .find_by_id(session_id)
            .await?
            .filter(|s| s.user_id == identity.user_id)
            .ok_or_else(|| ServiceError::not_found("Session", session_id.to_string()))?;

        let revoked = tokens.revoke(session_id, self.ctx.now()).await?;
        info!(session_id, revoked, "Session revoked");
        Ok(revoked)
    }

    /// Revoke every session of any user (administrative)
    #[instrument(skip(self))]
    pub async fn revoke_user_sessions(&self, user_id: i64) -> ServiceResult<u64> {
        if self.ctx.user_repo().find_by_id(user_id).await?.is_none() {
            return Err(AppError::UserNotFound.into());
        }

        let revoked = self
            .ctx
            .token_repo()
            .revoke_all_for_user(user_id, self.ctx.now())
            .await?;

        info!(user_id, revoked, "User sessions revoked by administrator");
        Ok(revoked)
    }

    /// Profile of the caller
    #[instrument(skip(self, identity), fields(user_id = identity.user_id))]
    pub async fn get_current_user(&self, identity: &Identity) -> ServiceResult<CurrentUserResponse> {
        self.ctx
            .user_repo()
            .find_by_id(identity.user_id)
            .await?
            .map(CurrentUserResponse::from)
            .ok_or(ServiceError::App(AppError::UserNotFound))
    }

    /// Create the configured administrator if no account with that username exists.
    /// Returns whether an account was created.
    #[instrument(skip(self, admin), fields(username = %admin.username))]
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdminConfig) -> ServiceResult<bool> {
        let users = self.ctx.user_repo();
        if users.find_by_identifier(&admin.username).await?.is_some() {
            debug!("Bootstrap admin already exists");
            return Ok(false);
        }

        validate_password_strength(&admin.password)?;
        let password_hash = self
            .ctx
            .password_service()
            .hash_blocking(admin.password.clone())
            .await?;

        let new_user = NewUser::new(admin.username.clone(), admin.email.clone())
            .with_role(UserRole::Admin)
            .with_status(UserStatus::Enabled);

        match users.create(&new_user, &password_hash, self.ctx.now()).await {
            Ok(user) => {
                info!(user_id = user.id, "Bootstrap admin created");
                Ok(true)
            }
            // Another instance won the race
            Err(e) if e.is_conflict() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn new_pair(&self, user_id: i64, client: &ClientMeta, now: DateTime<Utc>) -> ServiceResult<NewAuthToken> {
        let issued = self.ctx.jwt_service().generate_token_pair(user_id, now)?;

        Ok(NewAuthToken {
            user_id,
            access_token: issued.access_token,
            refresh_token: issued.refresh_token,
            access_expires_at: issued.access_expires_at,
            refresh_expires_at: issued.refresh_expires_at,
            client_ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
        })
    }
}

fn ensure_can_authenticate(user: &User) -> ServiceResult<()> {
    match user.status {
        UserStatus::Enabled => Ok(()),
        UserStatus::Disabled => {
            warn!(user_id = user.id, "Rejected: account disabled");
            Err(AppError::AccountDisabled.into())
        }
        UserStatus::Locked => {
            warn!(user_id = user.id, "Rejected: account locked");
            Err(AppError::AccountLocked.into())
        }
    }
}
