//! Response DTOs for API endpoints
//!
//! All response DTOs implement `Serialize` for JSON output. They are carried
//! in the `data` field of the response envelope.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Auth Responses
// ============================================================================

/// Issued access/refresh pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Seconds until the access token expires
    pub access_token_expires_in: i64,
    /// Seconds until the refresh token expires
    pub refresh_token_expires_in: i64,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// The authenticated user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub nickname: Option<String>,
    pub role: String,
    pub status: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub login_count: i64,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One login session; token strings are never exposed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: i64,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    /// The session that made this request
    pub current: bool,
}

/// Number of sessions a revoke call changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevokeResponse {
    pub revoked: u64,
}

impl RevokeResponse {
    pub fn new(revoked: u64) -> Self {
        Self { revoked }
    }
}

// ============================================================================
// Token Cleanup Responses
// ============================================================================

/// Outcome of one purge run. Failures are reported here, not raised.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    pub success: bool,
    pub deleted_count: u64,
    pub duration_ms: u64,
    pub executed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleanupResult {
    pub fn succeeded(deleted_count: u64, duration_ms: u64, executed_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            deleted_count,
            duration_ms,
            executed_at,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>, duration_ms: u64, executed_at: DateTime<Utc>) -> Self {
        Self {
            success: false,
            deleted_count: 0,
            duration_ms,
            executed_at,
            error: Some(error.into()),
        }
    }
}

/// Token counts plus the last cleanup time
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    pub total_tokens: i64,
    pub active_tokens: i64,
    pub expired_tokens: i64,
    pub revoked_tokens: i64,
    /// In-process only; reset on restart
    pub last_cleanup_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Cleanup service health
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn healthy(timestamp: DateTime<Utc>) -> Self {
        Self {
            status: "healthy".to_string(),
            message: "Token store is reachable".to_string(),
            timestamp,
        }
    }

    pub fn unhealthy(message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            status: "unhealthy".to_string(),
            message: message.into(),
            timestamp,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
}

/// Health check status for each dependency
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
}

impl ReadinessResponse {
    pub fn ready(database_healthy: bool) -> Self {
        Self {
            status: if database_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: if database_healthy { "healthy" } else { "unhealthy" }.to_string(),
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}
