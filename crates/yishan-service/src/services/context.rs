//! Service context - dependency container for services
//!
//! Holds the repositories, the JWT and password services, the clock, and the
//! in-process cleanup bookkeeping needed by services.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use yishan_common::auth::{JwtService, PasswordService};
use yishan_core::traits::{TokenRepository, UserRepository};
use yishan_core::{Clock, SystemClock};

use super::error::{ServiceError, ServiceResult};
use super::token_cleanup::CleanupTracker;

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It is cheap to clone; every clone shares the same repositories and the
/// same cleanup tracker.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    token_repo: Arc<dyn TokenRepository>,

    // Services
    jwt_service: Arc<JwtService>,
    password_service: PasswordService,

    clock: Arc<dyn Clock>,

    // Token cleanup
    cleanup_retention_days: u32,
    cleanup_tracker: Arc<CleanupTracker>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        token_repo: Arc<dyn TokenRepository>,
        jwt_service: Arc<JwtService>,
        clock: Arc<dyn Clock>,
        cleanup_retention_days: u32,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            jwt_service,
            password_service: PasswordService::new(),
            clock,
            cleanup_retention_days,
            cleanup_tracker: Arc::new(CleanupTracker::new()),
        }
    }

    // === Repositories ===

    /// Get the user repository
    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    /// Get the token repository
    pub fn token_repo(&self) -> &dyn TokenRepository {
        self.token_repo.as_ref()
    }

    // === Services ===

    /// Get the JWT service
    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    /// Get the password service
    pub fn password_service(&self) -> &PasswordService {
        &self.password_service
    }

    // === Time ===

    /// Current instant according to the injected clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // === Token cleanup ===

    /// Days an expired pair is kept before it may be purged
    pub fn cleanup_retention_days(&self) -> u32 {
        self.cleanup_retention_days
    }

    /// Shared record of the last successful cleanup
    pub fn cleanup_tracker(&self) -> &CleanupTracker {
        self.cleanup_tracker.as_ref()
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("jwt_service", &self.jwt_service)
            .field("cleanup_retention_days", &self.cleanup_retention_days)
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext with custom configuration
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    token_repo: Option<Arc<dyn TokenRepository>>,
    jwt_service: Option<Arc<JwtService>>,
    clock: Option<Arc<dyn Clock>>,
    cleanup_retention_days: u32,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            user_repo: None,
            token_repo: None,
            jwt_service: None,
            clock: None,
            cleanup_retention_days: 0,
        }
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn token_repo(mut self, repo: Arc<dyn TokenRepository>) -> Self {
        self.token_repo = Some(repo);
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    /// Time source; defaults to the system clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn cleanup_retention_days(mut self, days: u32) -> Self {
        self.cleanup_retention_days = days;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.user_repo
                .ok_or_else(|| ServiceError::validation("user_repo is required"))?,
            self.token_repo
                .ok_or_else(|| ServiceError::validation("token_repo is required"))?,
            self.jwt_service
                .ok_or_else(|| ServiceError::validation("jwt_service is required"))?,
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.cleanup_retention_days,
        ))
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use yishan_db::{MemoryTokenRepository, MemoryUserRepository};

    use super::*;

    #[test]
    fn test_builder_requires_repositories() {
        let err = ServiceContextBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("user_repo is required"));

        let err = ServiceContextBuilder::new()
            .user_repo(Arc::new(MemoryUserRepository::new()))
            .token_repo(Arc::new(MemoryTokenRepository::new()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("jwt_service is required"));
    }

    #[test]
    fn test_clones_share_cleanup_tracker() {
        let ctx = ServiceContextBuilder::new()
            .user_repo(Arc::new(MemoryUserRepository::new()))
            .token_repo(Arc::new(MemoryTokenRepository::new()))
            .jwt_service(Arc::new(JwtService::new(
                "test-secret-key-that-is-long-enough-for-hs256",
                "yishan-test",
                900,
                604_800,
            )))
            .cleanup_retention_days(3)
            .build()
            .unwrap();

        let copy = ctx.clone();
        let at = Utc::now();
        ctx.cleanup_tracker().record(at);

        assert_eq!(copy.cleanup_tracker().last_cleanup(), Some(at));
        assert_eq!(copy.cleanup_retention_days(), 3);
    }
}
