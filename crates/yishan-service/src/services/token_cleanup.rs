//! Token cleanup service
//!
//! Purges expired token pairs and reports token statistics. Meant to be
//! triggered from outside (an admin endpoint or an external scheduler);
//! [`TokenCleanupScheduler`] is an optional in-process trigger.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, instrument};
use yishan_common::AppError;

use crate::dto::{CleanupResult, CleanupStats, HealthStatus};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Time of the last successful purge. Process-local, lost on restart.
#[derive(Debug, Default)]
pub struct CleanupTracker {
    last_cleanup: Mutex<Option<DateTime<Utc>>>,
}

impl CleanupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, at: DateTime<Utc>) {
        *self.last_cleanup.lock() = Some(at);
    }

    pub fn last_cleanup(&self) -> Option<DateTime<Utc>> {
        *self.last_cleanup.lock()
    }
}

/// Token cleanup service
pub struct TokenCleanupService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> TokenCleanupService<'a> {
    /// Create a new TokenCleanupService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Delete pairs whose refresh token expired more than the retention
    /// window ago. Never fails; errors are reported in the result.
    #[instrument(skip(self))]
    pub async fn execute_cleanup(&self) -> CleanupResult {
        let started = Instant::now();
        let executed_at = self.ctx.now();
        let retention_days = self.ctx.cleanup_retention_days();

        let outcome = self
            .ctx
            .token_repo()
            .purge_expired(retention_days, executed_at)
            .await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(deleted_count) => {
                self.ctx.cleanup_tracker().record(executed_at);
                info!(deleted_count, duration_ms, retention_days, "Token cleanup completed");
                CleanupResult::succeeded(deleted_count, duration_ms, executed_at)
            }
            Err(e) => {
                error!(error = %e, duration_ms, "Token cleanup failed");
                CleanupResult::failed(AppError::Domain(e).client_message(), duration_ms, executed_at)
            }
        }
    }

    /// Token counts, globally or for one user, plus the last cleanup time
    #[instrument(skip(self))]
    pub async fn get_stats(&self, user_id: Option<i64>) -> ServiceResult<CleanupStats> {
        let stats = self.ctx.token_repo().stats(user_id, self.ctx.now()).await?;
        Ok(CleanupStats::new(
            stats,
            self.ctx.cleanup_tracker().last_cleanup(),
            user_id,
        ))
    }

    /// Probe the token store; failure is reported, not raised
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthStatus {
        let now = self.ctx.now();
        match self.ctx.token_repo().ping().await {
            Ok(()) => HealthStatus::healthy(now),
            Err(e) => {
                error!(error = %e, "Token store health check failed");
                HealthStatus::unhealthy(AppError::Domain(e).client_message(), now)
            }
        }
    }
}

/// Background task running [`TokenCleanupService::execute_cleanup`] on a fixed interval
pub struct TokenCleanupScheduler {
    ctx: Arc<ServiceContext>,
    interval_secs: u64,
}

impl TokenCleanupScheduler {
    /// Create a new cleanup scheduler
    pub fn new(ctx: Arc<ServiceContext>, interval_secs: u64) -> Self {
        Self { ctx, interval_secs }
    }

    /// Start the background cleanup task. The first run happens immediately.
    pub fn start(&self) -> JoinHandle<()> {
        let ctx = self.ctx.clone();
        let interval_secs = self.interval_secs.max(1);

        info!(interval_secs, "Starting token cleanup scheduler");

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                debug!("Running scheduled token cleanup");

                let result = TokenCleanupService::new(&ctx).execute_cleanup().await;
                if !result.success {
                    debug!(error = ?result.error, "Scheduled token cleanup will retry next tick");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use yishan_common::auth::JwtService;
    use yishan_common::BusinessCode;
    use yishan_core::entities::{AuthToken, NewAuthToken, RotateOutcome, TokenStats};
    use yishan_core::traits::{RepoResult, TokenRepository};
    use yishan_core::{Clock, DomainError};
    use yishan_db::MemoryUserRepository;

    use super::*;
    use crate::services::test_support::{fixture, TEST_SECRET};
    use crate::services::ServiceContextBuilder;

    fn pair(user_id: i64, tag: &str, issued: DateTime<Utc>) -> NewAuthToken {
        NewAuthToken {
            user_id,
            access_token: format!("access-{tag}"),
            refresh_token: format!("refresh-{tag}"),
            access_expires_at: issued + ChronoDuration::minutes(15),
            refresh_expires_at: issued + ChronoDuration::days(7),
            client_ip: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_cleanup_purges_expired_pairs() {
        let fx = fixture().await;
        let now = fx.clock.now();
        let past = now - ChronoDuration::days(30);
        for tag in ["a", "b", "c"] {
            fx.tokens.create(pair(fx.alice.id, tag, past), past).await.unwrap();
        }
        fx.tokens.create(pair(fx.alice.id, "live", now), now).await.unwrap();

        let cleanup = TokenCleanupService::new(&fx.ctx);
        let before = cleanup.get_stats(None).await.unwrap();
        assert_eq!(before.expired_tokens, 3);
        assert!(before.last_cleanup_time.is_none());

        let result = cleanup.execute_cleanup().await;
        assert!(result.success);
        assert_eq!(result.deleted_count, 3);
        assert_eq!(result.executed_at, now);

        let after = cleanup.get_stats(None).await.unwrap();
        assert_eq!(after.expired_tokens, 0);
        assert_eq!(after.total_tokens, 1);
        assert_eq!(after.active_tokens, 1);
        assert_eq!(after.last_cleanup_time, Some(now));

        // Nothing left to purge
        assert_eq!(cleanup.execute_cleanup().await.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_stats_scoped_to_user() {
        let fx = fixture().await;
        let now = fx.clock.now();
        fx.tokens.create(pair(fx.alice.id, "mine", now), now).await.unwrap();
        let other = fx.tokens.create(pair(fx.alice.id + 1, "theirs", now), now).await.unwrap();
        fx.tokens.revoke(other.id, now).await.unwrap();

        let cleanup = TokenCleanupService::new(&fx.ctx);
        let mine = cleanup.get_stats(Some(fx.alice.id)).await.unwrap();
        assert_eq!(mine.total_tokens, 1);
        assert_eq!(mine.revoked_tokens, 0);
        assert_eq!(mine.user_id, Some(fx.alice.id));

        let all = cleanup.get_stats(None).await.unwrap();
        assert_eq!(all.total_tokens, 2);
        assert_eq!(all.revoked_tokens, 1);
    }

    #[tokio::test]
    async fn test_health_check_healthy() {
        let fx = fixture().await;
        let health = TokenCleanupService::new(&fx.ctx).health_check().await;
        assert!(health.is_healthy());
        assert_eq!(health.timestamp, fx.clock.now());
    }

    /// Token store whose every call fails
    struct UnreachableTokenRepository;

    fn down<T>() -> RepoResult<T> {
        Err(DomainError::DatabaseError("connection refused".to_string()))
    }

    #[async_trait]
    impl TokenRepository for UnreachableTokenRepository {
        async fn create(&self, _: NewAuthToken, _: DateTime<Utc>) -> RepoResult<AuthToken> {
            down()
        }
        async fn find_by_id(&self, _: i64) -> RepoResult<Option<AuthToken>> {
            down()
        }
        async fn find_active_by_access_token(&self, _: &str, _: DateTime<Utc>) -> RepoResult<Option<AuthToken>> {
            down()
        }
        async fn find_active_by_refresh_token(&self, _: &str, _: DateTime<Utc>) -> RepoResult<Option<AuthToken>> {
            down()
        }
        async fn find_by_refresh_token(&self, _: &str) -> RepoResult<Option<AuthToken>> {
            down()
        }
        async fn revoke(&self, _: i64, _: DateTime<Utc>) -> RepoResult<bool> {
            down()
        }
        async fn revoke_all_for_user(&self, _: i64, _: DateTime<Utc>) -> RepoResult<u64> {
            down()
        }
        async fn rotate(&self, _: i64, _: NewAuthToken, _: DateTime<Utc>) -> RepoResult<RotateOutcome> {
            down()
        }
        async fn list_active_for_user(
            &self,
            _: i64,
            _: DateTime<Utc>,
            _: u64,
            _: u64,
        ) -> RepoResult<(Vec<AuthToken>, u64)> {
            down()
        }
        async fn purge_expired(&self, _: u32, _: DateTime<Utc>) -> RepoResult<u64> {
            down()
        }
        async fn stats(&self, _: Option<i64>, _: DateTime<Utc>) -> RepoResult<TokenStats> {
            down()
        }
        async fn ping(&self) -> RepoResult<()> {
            down()
        }
    }

    fn unreachable_ctx() -> ServiceContext {
        ServiceContextBuilder::new()
            .user_repo(Arc::new(MemoryUserRepository::new()))
            .token_repo(Arc::new(UnreachableTokenRepository))
            .jwt_service(Arc::new(JwtService::new(TEST_SECRET, "yishan-test", 900, 604_800)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_failures_are_reported_not_raised() {
        let ctx = unreachable_ctx();
        let cleanup = TokenCleanupService::new(&ctx);

        let result = cleanup.execute_cleanup().await;
        assert!(!result.success);
        assert_eq!(result.deleted_count, 0);
        // Store detail stays in the logs
        let error = result.error.unwrap();
        assert_eq!(error, BusinessCode::DatabaseError.message());
        assert!(!error.contains("connection refused"));
        assert!(ctx.cleanup_tracker().last_cleanup().is_none());

        let health = cleanup.health_check().await;
        assert_eq!(health.status, "unhealthy");
        assert_eq!(health.message, BusinessCode::DatabaseError.message());

        assert!(cleanup.get_stats(None).await.is_err());
    }

    #[tokio::test]
    async fn test_scheduler_runs_immediately() {
        let fx = fixture().await;
        let past = fx.clock.now() - ChronoDuration::days(30);
        fx.tokens.create(pair(fx.alice.id, "old", past), past).await.unwrap();

        let ctx = Arc::new(fx.ctx.clone());
        let handle = TokenCleanupScheduler::new(ctx.clone(), 3600).start();

        for _ in 0..50 {
            if fx.tokens.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(fx.tokens.is_empty());
        assert!(ctx.cleanup_tracker().last_cleanup().is_some());
    }
}
