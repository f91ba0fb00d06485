//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod auth;
pub mod health;
pub mod sessions;
pub mod system;

use axum::http::StatusCode;
use yishan_common::{ApiResponse, BusinessCode};

use crate::response::ApiJson;

/// Envelope for unknown routes
pub async fn not_found() -> (StatusCode, ApiJson<()>) {
    (
        StatusCode::NOT_FOUND,
        ApiJson(ApiResponse::from_code(BusinessCode::ResourceNotFound)),
    )
}
