//! Guildkit standalone runner.
//!
//! Loads configuration, connects the configured backend, warms the guild
//! settings cache and keeps cooldowns in sync until Ctrl+C.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use guildkit::{Config, GuildKit};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("guildkit=info,mongodb=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting guildkit...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Default prefix: {}", config.default_prefix);

    if config.bot_owners.is_empty() {
        info!("No bot owners configured (BOT_OWNERS is empty)");
    } else {
        info!("Bot owners: {:?}", config.bot_owners);
    }

    let kit = Arc::new(GuildKit::init(&config, config.persistence()).await?);
    info!("Persistence status: {}", kit.connection_status());

    kit.spawn_cooldown_sweeper();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    kit.shutdown().await;

    Ok(())
}
