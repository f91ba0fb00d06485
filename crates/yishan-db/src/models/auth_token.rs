//! Auth token database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for auth_tokens table
#[derive(Debug, Clone, FromRow)]
pub struct AuthTokenModel {
    pub id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub rotated_at: Option<DateTime<Utc>>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counts row
#[derive(Debug, Clone, Copy, FromRow)]
pub struct TokenStatsModel {
    pub total: i64,
    pub active: i64,
    pub expired: i64,
    pub revoked: i64,
}
