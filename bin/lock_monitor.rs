//! # Lock Monitor Service
//!
//! Long-running subscriber that records Dash ChainLock and InstantLock
//! sightings into SQLite.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin lock_monitor
//! ```
//!
//! Press Ctrl+C to stop gracefully.

use anyhow::Result;
use clap::Parser;
use dash_lock_monitor::{
    dispatcher::Dispatcher, lock_store::LockStore, recent_tx_cache::RecentTxCache,
    settings::Settings, zmq_subscriber,
};
use env_logger::Env;
use log::{info, warn};
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "lock_monitor", about = "Dash ChainLock/InstantLock monitor")]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "Config.toml")]
    config: String,

    /// Override the ZMQ endpoint (e.g. tcp://127.0.0.1:20003)
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();

    // 1. Load settings
    let mut settings = Settings::from_file(&args.config)?;
    if let Some(endpoint) = args.endpoint {
        settings.zmq.endpoint = endpoint;
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log.level.as_str()))
        .init();

    println!("🚀 Starting Dash Lock Monitor");
    println!("═══════════════════════════════════════════════════════════════════\n");
    println!("✅ Settings loaded (endpoint: {})", settings.zmq.endpoint);

    // 2. Open the lock store (creates files and schema on first run)
    let store = LockStore::connect(&settings).await?;
    println!("✅ Lock store ready");

    // 3. Start the ZMQ subscription
    let (subscription, mut notifications) = zmq_subscriber::start(&settings.zmq.endpoint)?;
    println!("✅ Subscribed, waiting for notifications\n");

    // 4. Dispatch loop: one message fully processed before the next
    let recent = RecentTxCache::with_capacity(settings.dedup.capacity);
    let mut dispatcher = Dispatcher::new(store, recent);

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            raw = notifications.recv() => {
                match raw {
                    Some(raw) => {
                        dispatcher.process_logged(&raw).await;
                    }
                    None => {
                        warn!("Notification channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    subscription.shutdown();
    info!("Shutdown complete");
    Ok(())
}
