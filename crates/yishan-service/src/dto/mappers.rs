//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use chrono::{DateTime, Utc};
use yishan_core::entities::{AuthToken, TokenStats, User};

use super::responses::{CleanupStats, CurrentUserResponse, SessionResponse, TokenPairResponse};

// ============================================================================
// User Mappers
// ============================================================================

impl From<&User> for CurrentUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            role: user.role.to_string(),
            status: user.status.to_string(),
            last_login_at: user.last_login_at,
            last_login_ip: user.last_login_ip.clone(),
            login_count: user.login_count,
            password_changed_at: user.password_changed_at,
            created_at: user.created_at,
        }
    }
}

impl From<User> for CurrentUserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

// ============================================================================
// Token Mappers
// ============================================================================

impl TokenPairResponse {
    /// Build from a stored pair; `expires_in` values are relative to `now`
    pub fn from_token(token: &AuthToken, now: DateTime<Utc>) -> Self {
        Self {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            token_type: "Bearer".to_string(),
            access_token_expires_in: token.access_expires_in(now),
            refresh_token_expires_in: token.refresh_expires_in(now),
            access_token_expires_at: token.access_expires_at,
            refresh_token_expires_at: token.refresh_expires_at,
        }
    }
}

impl From<&AuthToken> for SessionResponse {
    fn from(token: &AuthToken) -> Self {
        Self {
            id: token.id,
            client_ip: token.client_ip.clone(),
            user_agent: token.user_agent.clone(),
            created_at: token.created_at,
            access_expires_at: token.access_expires_at,
            refresh_expires_at: token.refresh_expires_at,
            current: false,
        }
    }
}

impl CleanupStats {
    pub fn new(stats: TokenStats, last_cleanup_time: Option<DateTime<Utc>>, user_id: Option<i64>) -> Self {
        Self {
            total_tokens: stats.total,
            active_tokens: stats.active,
            expired_tokens: stats.expired,
            revoked_tokens: stats.revoked,
            last_cleanup_time,
            user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use yishan_core::entities::NewAuthToken;

    use super::*;

    fn stored_pair(now: DateTime<Utc>) -> AuthToken {
        NewAuthToken {
            user_id: 7,
            access_token: "opaque-access".to_string(),
            refresh_token: "opaque-refresh".to_string(),
            access_expires_at: now + Duration::seconds(900),
            refresh_expires_at: now + Duration::days(7),
            client_ip: Some("10.0.0.1".to_string()),
            user_agent: Some("curl/8.0".to_string()),
        }
        .into_token(42, now)
    }

    #[test]
    fn test_token_pair_expires_in_is_relative() {
        let now = Utc::now();
        let token = stored_pair(now);

        let pair = TokenPairResponse::from_token(&token, now);
        assert_eq!(pair.access_token_expires_in, 900);
        assert_eq!(pair.refresh_token_expires_in, 604_800);

        let later = TokenPairResponse::from_token(&token, now + Duration::seconds(1000));
        assert_eq!(later.access_token_expires_in, 0);
    }

    #[test]
    fn test_session_response_hides_tokens() {
        let now = Utc::now();
        let session = SessionResponse::from(&stored_pair(now));
        let json = serde_json::to_string(&session).unwrap();

        assert_eq!(session.id, 42);
        assert!(!json.contains("opaque-"));
        assert!(json.contains("curl/8.0"));
    }
}
