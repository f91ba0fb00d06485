//! Route definitions
//!
//! All API routes are mounted under /api/v1.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{self, auth, health, sessions, system};
use crate::state::AppState;

/// Create the main API router with all routes (excluding health for separate middleware handling)
pub fn create_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", api_v1_routes())
        .fallback(handlers::not_found)
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(session_routes())
        .merge(system_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/refresh", post(auth::refresh))
        .route("/getCurrentUser", get(auth::get_current_user))
        .route("/changePassword", post(auth::change_password))
}

/// Session routes
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/:session_id", delete(sessions::revoke_session))
}

/// Token maintenance routes (admin)
fn system_routes() -> Router<AppState> {
    Router::new()
        .route("/system/tokens/cleanup", post(system::cleanup))
        .route("/system/tokens/stats", get(system::stats))
        .route("/system/tokens/health", get(system::health))
        .route("/system/tokens/revoke/:user_id", post(system::revoke_user))
}
