//! Storefront - catalog, cart and admin API server

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use storefront::{AppState, Backend, Config, EventPublisher, Links, MemoryRepository, PostgresRepository, StoreRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let repo: Arc<dyn StoreRepository> = match config.backend {
        Backend::Postgres => {
            let url = config.database_url.as_deref().ok_or(storefront::ConfigError::Missing("DATABASE_URL"))?;
            let db = PgPoolOptions::new().max_connections(config.max_connections).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Arc::new(PostgresRepository::new(db))
        }
        Backend::Memory => {
            tracing::warn!("using the in-memory store; data will not survive a restart");
            Arc::new(MemoryRepository::new())
        }
    };
    let events = EventPublisher::connect(config.nats_url.as_deref()).await;
    let state = AppState::new(repo, events, Links::new(&config.public_base_url));

    let app = storefront::router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, backend = ?config.backend, "storefront listening");
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
