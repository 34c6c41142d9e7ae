// Main entry point for the intake API server

use anyhow::{Context, Result};
use intake_core::kernel::ServerDeps;
use intake_core::server::{build_app, build_state};
use intake_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,intake_core=debug,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting behavioral health intake API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        config_dir = %config.config_dir.display(),
        reload = ?config.data_reload,
        timezone = %config.timezone,
        "Configuration loaded"
    );

    // External capabilities (all optional)
    let deps = ServerDeps::from_config(&config).context("Failed to build service clients")?;

    // Build application
    let state = build_state(&config, deps)
        .await
        .context("Failed to load directory data")?;
    let app = build_app(state, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
