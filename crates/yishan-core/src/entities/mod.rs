//! Domain entities - core business objects

mod auth_token;
mod user;

pub use auth_token::{AuthToken, NewAuthToken, RotateOutcome, TokenStats};
pub use user::{NewUser, User, UserRole, UserStatus};
