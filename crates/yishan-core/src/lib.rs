//! # yishan-core
//!
//! Domain layer containing entities, repository traits, and the clock abstraction.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod clock;
pub mod entities;
pub mod error;
pub mod traits;

// Re-export commonly used types at crate root
pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::{
    AuthToken, NewAuthToken, NewUser, RotateOutcome, TokenStats, User, UserRole, UserStatus,
};
pub use error::DomainError;
pub use traits::{purge_cutoff, RepoResult, TokenRepository, UserRepository};
