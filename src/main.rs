//! StickFix - sticker collection bot
//!
//! This is the main entry point for the StickFix bot process.

use anyhow::{Context as _, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use stickfix::domain_types::{EvictionIntervalSecs, EvictionThresholdSecs};
use stickfix::storage::{EphemeralStore, MetaStore};
use stickfix::telegram::{TelegramTransport, run_long_poll};
use stickfix::time_provider::production_time_provider;
use stickfix::{DatabaseConnection, Dispatcher, StickfixConfig, StickfixContext};
use tokio::sync::mpsc;
use tracing::info;

/// StickFix bot process
#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"), about)]
struct Args {
    /// Path to the SQLite database file
    #[arg(long, default_value = "stickfix.db")]
    database: PathBuf,

    /// Seconds between eviction sweeps of pending registrations
    #[arg(long, default_value_t = 900)]
    eviction_interval_secs: u64,

    /// Age in seconds past which a pending registration is dropped
    #[arg(long, default_value_t = 3600)]
    eviction_threshold_secs: u64,

    /// Base URL of the Bot API endpoint
    #[arg(long, default_value = "https://api.telegram.org")]
    api_base_url: String,

    /// Long-poll timeout in seconds
    #[arg(long, default_value_t = 30)]
    poll_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> Result<StickfixConfig> {
        Ok(StickfixConfig {
            database_path: self.database,
            eviction_interval: EvictionIntervalSecs::try_new(self.eviction_interval_secs)
                .context("invalid eviction interval")?,
            eviction_threshold: EvictionThresholdSecs::try_new(self.eviction_threshold_secs)
                .context("invalid eviction threshold")?,
            api_base_url: self.api_base_url,
            poll_timeout_secs: self.poll_timeout_secs,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stickfix=info".parse()?),
        )
        .init();

    let config = Args::parse().into_config()?;
    info!(
        database = %config.database_path.display(),
        eviction_interval = %config.eviction_interval,
        eviction_threshold = %config.eviction_threshold,
        "starting StickFix"
    );

    let connection = DatabaseConnection::initialize(config.database_config()?).await?;
    let time = production_time_provider();

    let api_key = MetaStore::new(connection.clone())
        .query_api_key()
        .await
        .context("refusing to start without an API key in the meta table")?;

    let ephemeral = EphemeralStore::init(
        time.clone(),
        config.eviction_interval,
        config.eviction_threshold,
    )
    .await?;

    let transport = Arc::new(TelegramTransport::with_base_url(
        &config.api_base_url,
        &api_key,
    ));
    let context = StickfixContext::new(connection, ephemeral, transport.clone(), time);
    let dispatcher = Arc::new(Dispatcher::with_default_handlers(context));

    let (events_tx, events_rx) = mpsc::channel(1024);
    tokio::spawn(run_long_poll(transport, events_tx, config.poll_timeout_secs));
    info!("StickFix is polling for updates");

    dispatcher.run(events_rx).await;
    info!("StickFix shutting down");
    Ok(())
}
