//! Database models - SQLx-compatible structs for PostgreSQL tables

mod auth_token;
mod user;

pub use auth_token::{AuthTokenModel, TokenStatsModel};
pub use user::UserModel;
