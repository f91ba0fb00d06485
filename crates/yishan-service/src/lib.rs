//! # yishan-service
//!
//! Application layer containing the authentication and token cleanup
//! services, their dependency container, and DTOs.

pub mod dto;
pub mod services;

pub use services::{
    AuthService, CleanupTracker, Identity, ServiceContext, ServiceContextBuilder, ServiceError,
    ServiceResult, TokenCleanupScheduler, TokenCleanupService,
};
