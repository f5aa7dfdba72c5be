//! finderd - Grocery aisle product finder daemon
//!
//! This daemon:
//! 1. Opens the product catalog database (seeding it from CSV when empty)
//! 2. Warms up the configured classifier backend
//! 3. Serves the upload pages and the prediction API over HTTP

use std::sync::mpsc;

use anyhow::Result;

use aisle_finder::{FinderConfig, FinderServer, ServerConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = FinderConfig::load()?;
    log::info!(
        "finderd starting (db: {}, catalog: {}, classifier: {})",
        config.db_path,
        config.catalog_csv.display(),
        config.classifier.backend
    );

    let handle = FinderServer::new(ServerConfig::from(&config)).spawn()?;
    log::info!("product finder listening on http://{}", handle.addr());

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    log::info!("finderd waiting for shutdown signal (Ctrl-C)...");
    let _ = rx.recv();
    log::info!("shutdown signal received, stopping server...");
    handle.stop()?;

    Ok(())
}
