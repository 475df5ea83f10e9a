//! Car Records Service - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Construct the record store, attachment issuer and car service
//! 5. Build HTTP router with routes and middleware
//! 6. Start server on configured port

use std::sync::Arc;

use car_records_server::{
    config, db,
    middleware::auth::TokenVerifier,
    routes,
    services::{
        attachment_issuer::S3AttachmentIssuer, car_service::CarService, car_store::PgCarStore,
    },
    state::AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    let attachment_config = config.attachments()?;
    tracing::info!(?config, "Configuration loaded");

    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let store = Arc::new(PgCarStore::new(pool, attachment_config.bucket_name.clone()));
    let attachments = Arc::new(S3AttachmentIssuer::new(attachment_config));

    let state = AppState {
        cars: CarService::new(store, attachments),
        tokens: Arc::new(TokenVerifier::new(
            &config.jwt_secret,
            config.jwt_audience.as_deref(),
        )),
    };

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
