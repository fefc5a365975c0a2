mod config;

use config::Config;
use fourinrow::error::ServerError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    let addr = config.addr();

    let pool = sqlx::SqlitePool::connect(&config.database_url).await?;
    sqlx::migrate!().run(&pool).await?;

    let app = fourinrow::app(pool).layer(fourinrow::cors(&config.frontend_origin));

    tracing::info!(
        "Starting server on {} (CORS allowed: {})",
        addr,
        config.frontend_origin
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
