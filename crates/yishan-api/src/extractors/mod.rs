//! Axum extractors for request handling
//!
//! Custom extractors for authentication, client metadata, validation, and pagination.

mod auth;
mod client;
mod pagination;
mod path;
mod validated;

pub use auth::{AdminUser, AuthUser};
pub use client::ClientInfo;
pub use pagination::{PageParams, PageQuery};
pub use path::{ApiPath, ApiQuery};
pub use validated::{OptionalJson, ValidatedJson};
