//! Notification scheduler daemon for the nosdois backend.
//!
//! Wires the SQLite store, relationship resolver and notification outbox into
//! the background scheduler and runs it until ctrl-c.

use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::watch;

use nosdois::core::Config;
use nosdois::database::Database;
use nosdois::features::notify::NotifyScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    info!(
        "starting nosdois notification scheduler (database: {})",
        config.database_path
    );

    let database = Arc::new(Database::open(&config.database_path)?);
    let scheduler = NotifyScheduler::new(
        database.clone(),
        database.clone(),
        database,
        &config,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for shutdown signal: {e}");
            return;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    scheduler.run(shutdown_rx).await;
    Ok(())
}
