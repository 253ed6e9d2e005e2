use anyhow::{Context, Result};
use tracing::info;

use grave_registry_api::{app, config, middleware, services};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Grave Registry API v{}", env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;

    services::bootstrap_admin(&pool, &config.admin).await?;

    tokio::fs::create_dir_all(&config.storage.upload_dir)
        .await
        .with_context(|| format!("Cannot create {}", config.storage.upload_dir.display()))?;

    let addr = config.socket_addr()?;
    let state = app::AppState::new(config, pool).context("Invalid JWT key configuration")?;
    let router = app::create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
