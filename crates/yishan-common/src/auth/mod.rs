//! Authentication utilities

mod jwt;
mod password;

pub use jwt::{Claims, IssuedTokens, JwtService, TokenType};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordService};
