//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize`; bodies with field rules also
//! implement `Validate`. Field names are camelCase on the wire.

use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Auth Requests
// ============================================================================

/// User login request
///
/// `username` accepts either the username or the email address.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(alias = "identifier", alias = "email")]
    #[validate(length(min = 1, max = 255, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(alias = "refresh_token")]
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Logout request. An empty body logs out the current session only.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub all_devices: bool,
}

/// Password change request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 128, message = "Current password is required"))]
    pub old_password: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

// ============================================================================
// Request metadata
// ============================================================================

/// Where a request came from; stored with each issued pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientMeta {
    pub fn new(ip: Option<String>, user_agent: Option<String>) -> Self {
        Self { ip, user_agent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_aliases() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"alice@example.com","password":"x"}"#).unwrap();
        assert_eq!(req.username, "alice@example.com");

        let req: LoginRequest =
            serde_json::from_str(r#"{"identifier":"alice","password":"x"}"#).unwrap();
        assert_eq!(req.username, "alice");
    }

    #[test]
    fn test_login_request_validation() {
        let req = LoginRequest {
            username: String::new(),
            password: "Secret123!".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_refresh_request_accepts_both_casings() {
        let camel: RefreshTokenRequest = serde_json::from_str(r#"{"refreshToken":"abc"}"#).unwrap();
        let snake: RefreshTokenRequest = serde_json::from_str(r#"{"refresh_token":"abc"}"#).unwrap();
        assert_eq!(camel.refresh_token, snake.refresh_token);
    }

    #[test]
    fn test_logout_request_defaults() {
        let req: LogoutRequest = serde_json::from_str("{}").unwrap();
        assert!(!req.all_devices);

        let req: LogoutRequest = serde_json::from_str(r#"{"allDevices":true}"#).unwrap();
        assert!(req.all_devices);
    }

    #[test]
    fn test_change_password_validation() {
        let req = ChangePasswordRequest {
            old_password: "Secret123!".to_string(),
            new_password: "short".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("new_password"));
    }
}
