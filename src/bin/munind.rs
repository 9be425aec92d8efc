//! munind — Muninn daemon.
//!
//! Serves latest-file lookups over HTTP from a DynamoDB-backed
//! [`FileCache`](muninn::FileCache). The cache is seeded from the store
//! before the listener binds; a failed seed aborts startup.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use muninn::cache::FileCache;
use muninn::server;
use muninn::server::config::Config;
use muninn::store::DynamoStore;

/// Muninn latest-file lookup daemon.
#[derive(Parser)]
#[command(name = "munind")]
#[command(version = muninn::PKG_VERSION)]
#[command(about = "Muninn latest-file lookup daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let addr: std::net::SocketAddr = config.server.address.parse().map_err(|e| {
        muninn::MuninnError::Configuration(format!(
            "invalid address {:?}: {e}",
            config.server.address
        ))
    })?;

    let store = DynamoStore::from_env(&config.store.table, config.store.region.clone()).await;
    let cache = FileCache::new(
        Arc::new(store),
        config.limits.known.params(),
        config.limits.unseen.params(),
        Duration::from_secs(config.store.fetch_timeout_secs),
    );

    // Seed before binding: every identifier already in the store must be
    // on the known-identifier path before the first request arrives.
    let seeded = cache.seed().await?;
    info!(
        version = muninn::PKG_VERSION,
        %addr,
        table = %config.store.table,
        seeded,
        "munind starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, server::router(Arc::new(cache)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Entry state is in-memory only; shutdown needs no teardown beyond
    // letting in-flight requests finish.
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
