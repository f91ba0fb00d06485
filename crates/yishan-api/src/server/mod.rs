//! Server setup and initialization
//!
//! Provides the main application builder and server runner.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};
use yishan_common::{AppConfig, AppError, JwtService};
use yishan_db::{create_pool, run_migrations, DatabaseConfig, PgPool, PgTokenRepository, PgUserRepository};
use yishan_service::{AuthService, ServiceContext, ServiceContextBuilder, TokenCleanupScheduler};

use crate::middleware::{apply_middleware, apply_request_id};
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
///
/// # Errors
/// Returns `AppError::Config` if the middleware configuration is invalid
pub fn create_app(state: AppState) -> Result<Router, AppError> {
    let api = apply_middleware(create_router(), state.config())?;
    let app = api.merge(health_routes()).with_state(state);
    Ok(apply_request_id(app))
}

/// Connect to PostgreSQL and apply pending migrations
pub async fn connect_database(config: &AppConfig) -> Result<PgPool, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    run_migrations(&pool, &config.database.migrations_dir)
        .await
        .map_err(|e| AppError::Database(format!("migrations failed: {e}")))?;
    info!(dir = %config.database.migrations_dir, "Migrations applied");

    Ok(pool)
}

/// Wire repositories and services over an open pool
pub fn create_service_context(config: &AppConfig, pool: &PgPool) -> Result<ServiceContext, AppError> {
    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.issuer.clone(),
        config.jwt.access_token_expiry,
        config.jwt.refresh_token_expiry,
    ));

    ServiceContextBuilder::new()
        .user_repo(Arc::new(PgUserRepository::new(pool.clone())))
        .token_repo(Arc::new(PgTokenRepository::new(pool.clone())))
        .jwt_service(jwt_service)
        .cleanup_retention_days(config.token_cleanup.retention_days)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))
}

/// Create the configured administrator account if it does not exist yet
pub async fn bootstrap_admin(state: &AppState) -> Result<(), AppError> {
    let Some(admin) = &state.config().bootstrap_admin else {
        return Ok(());
    };

    let created = AuthService::new(state.service_context())
        .bootstrap_admin(admin)
        .await?;
    if created {
        info!(username = %admin.username, "Bootstrap admin created");
    }
    Ok(())
}

/// Run the HTTP server until ctrl-c
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid bind address {}: {e}", config.api.address())))?;

    let pool = connect_database(&config).await?;
    let service_context = Arc::new(create_service_context(&config, &pool)?);
    let cleanup = config.token_cleanup.clone();
    let state = AppState::from_shared(Arc::clone(&service_context), Arc::new(config));

    bootstrap_admin(&state).await?;

    let scheduler = cleanup
        .scheduler_enabled()
        .then(|| TokenCleanupScheduler::new(service_context, cleanup.interval_secs).start());

    let app = create_app(state)?;
    let result = run_server(app, addr).await;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    pool.close().await;
    info!("Server stopped");

    result
}
