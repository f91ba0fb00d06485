//! # yishan-db
//!
//! Persistence layer implementing the yishan-core repository traits.
//!
//! - PostgreSQL pool management and migrations
//! - SQLx `FromRow` models and model → entity mappers
//! - `PgUserRepository` / `PgTokenRepository`
//! - `MemoryUserRepository` / `MemoryTokenRepository` for tests and database-less runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use yishan_db::{create_pool, run_migrations, DatabaseConfig, PgTokenRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     run_migrations(&pool, "./migrations").await?;
//!     let tokens = PgTokenRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::{MemoryTokenRepository, MemoryUserRepository};
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{PgTokenRepository, PgUserRepository};
