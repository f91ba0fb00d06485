//! In-memory repository implementations
//!
//! Same contracts as the PostgreSQL repositories, backed by a mutex-guarded
//! map. Used by tests and for running the API without a database.

mod token;
mod user;

pub use token::MemoryTokenRepository;
pub use user::MemoryUserRepository;
