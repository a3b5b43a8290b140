//! Betting service entry point
//!
//! Loads configuration, connects the Postgres-backed ledger store, and serves
//! the REST API until a shutdown signal arrives.

use anyhow::{Context, Result};
use tracing::info;

use betting_service::{initialize_logging, load_config, AppContext};
use event_gateway::EventGatewayClient;
use wager_ledger::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    initialize_logging()?;

    info!("Starting betting service v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let store = PgStore::connect(&config.database_url, config.ledger.clone())
        .await
        .context("Failed to connect to database")?;
    store.migrate().await.context("Failed to run migrations")?;
    info!("Ledger store ready");

    let gateway = EventGatewayClient::new(config.gateway.clone())
        .context("Failed to build event gateway client")?;

    let ctx = AppContext::new(store, gateway);
    let api = betting_service::routes(ctx);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!(%addr, "betting service listening");

    let (_, server) = warp::serve(api).bind_with_graceful_shutdown(addr, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received");
    });
    server.await;

    info!("Betting service shutdown complete");
    Ok(())
}
