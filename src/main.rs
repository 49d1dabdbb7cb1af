// Blogsite Server - read API over the blog content store

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use blogsite_store::{
    api::create_router,
    api::BLOGS_BASE_PATH,
    app_state::AppState,
    config::Config,
    data_seeder::seed_sample_data,
    infrastructure::TtlSweeper,
    services::BackupScheduler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    if config.store.seed_sample_data {
        if let Err(e) = seed_sample_data(&app_state).await {
            warn!("Sample data seeding failed: {}", e);
        }
    }

    let sweeper = TtlSweeper::start(app_state.store.clone(), config.ttl_sweep_interval());
    let backups = config.backup.enabled.then(|| {
        BackupScheduler::start(app_state.backups.clone(), config.backup_check_interval())
    });

    let app = create_router(app_state);

    // Start server
    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Blogsite server listening on http://{}", listener.local_addr()?);
    info!("Blog API mounted at {}", BLOGS_BASE_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    if let Some(backups) = backups {
        backups.shutdown().await;
    }
    info!("Blogsite server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
