//! Business logic services
//!
//! This module contains all service layer implementations that handle
//! business logic, validation, and orchestration of domain operations.

pub mod auth;
pub mod context;
pub mod error;
pub mod token_cleanup;

// Re-export all services for convenience
pub use auth::{AuthService, Identity};
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use token_cleanup::{CleanupTracker, TokenCleanupScheduler, TokenCleanupService};

#[cfg(test)]
pub(crate) mod test_support;
