//! Model to entity mappers
//!
//! `From`/`TryFrom<Model> for Entity` conversions from database rows to
//! domain objects.

mod auth_token;
mod user;
