//! Repository traits (ports) - define the interface for data access
//!
//! These traits follow the Repository pattern from Domain-Driven Design.
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Time-dependent queries take `now` explicitly
//! so the caller's [`Clock`](crate::Clock) decides what "expired" means.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{AuthToken, NewAuthToken, NewUser, RotateOutcome, TokenStats, User, UserStatus};
use crate::error::DomainError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>>;

    /// Find user whose username or email equals `identifier`
    async fn find_by_identifier(&self, identifier: &str) -> RepoResult<Option<User>>;

    /// Create a new user with an already-hashed password
    async fn create(&self, user: &NewUser, password_hash: &str, now: DateTime<Utc>) -> RepoResult<User>;

    /// Get password hash for authentication
    async fn get_password_hash(&self, id: i64) -> RepoResult<Option<String>>;

    /// Replace the password hash and stamp `password_changed_at`
    async fn update_password(&self, id: i64, password_hash: &str, now: DateTime<Utc>) -> RepoResult<()>;

    /// Record a successful login (timestamp, IP, counter increment)
    async fn record_login(&self, id: i64, at: DateTime<Utc>, ip: Option<&str>) -> RepoResult<()>;

    /// Change account status
    async fn set_status(&self, id: i64, status: UserStatus, now: DateTime<Utc>) -> RepoResult<()>;
}

// ============================================================================
// Token Repository
// ============================================================================

#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Insert a new pair. Fails with `TokenConflict` on token-string collision.
    async fn create(&self, token: NewAuthToken, now: DateTime<Utc>) -> RepoResult<AuthToken>;

    /// Find a pair by ID regardless of state
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<AuthToken>>;

    /// Pair whose access token matches, only while not revoked and not expired
    async fn find_active_by_access_token(&self, token: &str, now: DateTime<Utc>) -> RepoResult<Option<AuthToken>>;

    /// Pair whose refresh token matches, only while not revoked and not expired
    async fn find_active_by_refresh_token(&self, token: &str, now: DateTime<Utc>) -> RepoResult<Option<AuthToken>>;

    /// Pair whose refresh token matches, in any state (used for replay detection)
    async fn find_by_refresh_token(&self, token: &str) -> RepoResult<Option<AuthToken>>;

    /// Revoke one pair. Idempotent; returns whether this call changed it.
    async fn revoke(&self, id: i64, now: DateTime<Utc>) -> RepoResult<bool>;

    /// Revoke every non-revoked pair of a user; returns the number revoked
    async fn revoke_all_for_user(&self, user_id: i64, now: DateTime<Utc>) -> RepoResult<u64>;

    /// Atomically revoke `old_id` and insert `new_token`.
    /// If `old_id` is already revoked nothing is written.
    async fn rotate(&self, old_id: i64, new_token: NewAuthToken, now: DateTime<Utc>) -> RepoResult<RotateOutcome>;

    /// Page of a user's refresh-active pairs, newest first, plus the total count
    async fn list_active_for_user(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> RepoResult<(Vec<AuthToken>, u64)>;

    /// Physically delete pairs whose refresh expiry is older than
    /// `now - retention_days`; returns the number deleted
    async fn purge_expired(&self, retention_days: u32, now: DateTime<Utc>) -> RepoResult<u64>;

    /// Counts, globally or scoped to one user
    async fn stats(&self, user_id: Option<i64>, now: DateTime<Utc>) -> RepoResult<TokenStats>;

    /// Cheap reachability probe
    async fn ping(&self) -> RepoResult<()>;
}

/// Cutoff used by `purge_expired`. `None` when the retention window reaches
/// past the representable range, in which case nothing is old enough to purge.
pub fn purge_cutoff(retention_days: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(chrono::Duration::days(i64::from(retention_days)))
}
