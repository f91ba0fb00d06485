//! Yishan API Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p yishan-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use tracing::{error, info};
use yishan_common::{try_init_tracing_with_config, AppConfig, Environment, TracingConfig};

#[tokio::main]
async fn main() {
    // Tracing format depends on APP_ENV, which is read before the full config
    let _ = dotenvy::dotenv();
    let env = std::env::var("APP_ENV")
        .ok()
        .and_then(|v| v.parse::<Environment>().ok())
        .unwrap_or_default();

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting Yishan API Server...");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;

    info!(
        env = ?config.app.env,
        port = config.api.port,
        "Configuration loaded"
    );

    yishan_api::run(config).await?;

    Ok(())
}
