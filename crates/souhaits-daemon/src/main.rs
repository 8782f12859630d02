//! souhaits-daemon: hosts the wishlist service.
//!
//! Opens the database, wires the service to a mailbox file, and keeps the
//! garbage collector running until interrupted.

mod config;
mod sweeper;

use std::sync::Arc;

use souhaits_core::{MailboxFile, Service};
use tracing::info;

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("souhaits={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Souhaits daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 3. Open database and build the service
    let db_path = config.database_path();
    let mailbox = MailboxFile::new(config.mailbox_path());
    info!(db = %db_path.display(), mailbox = %mailbox.path().display(), "opening store");
    let service = Arc::new(Service::open(
        &db_path,
        config.service_config(),
        Arc::new(mailbox),
    )?);

    // 4. Run the garbage collector until shutdown
    tokio::select! {
        _ = sweeper::run(service.clone(), config.gc_interval()) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!("Daemon stopped");
    Ok(())
}
