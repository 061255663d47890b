mod api;
mod config;
mod database;
mod error;
mod services;
mod store;
mod utils;

use anyhow::Result;
use config::Config;
use std::sync::Arc;
use store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "school_portal=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let pool =
        database::create_connection(&config.database_url, config.database_max_connections)
            .await?;
    let store = Arc::new(SqliteStore::new(pool));

    tracing::info!("Starting school portal on {}", config.bind_addr);

    if let Err(why) = api::serve(config.bind_addr, store).await {
        tracing::error!("Server error: {:?}", why);
    }

    Ok(())
}
