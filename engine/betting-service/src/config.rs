//! Service configuration management

use anyhow::{Context, Result};
use event_gateway::GatewayConfig;
use wager_ledger::LedgerConfig;

/// Main service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listen port for the HTTP API
    pub port: u16,

    /// Postgres connection string for the ledger store
    pub database_url: String,

    /// Ledger store tuning
    pub ledger: LedgerConfig,

    /// Upstream provider credentials
    pub gateway: GatewayConfig,
}

/// Load configuration from environment variables
pub fn load_config() -> Result<ServiceConfig> {
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .context("Invalid PORT")?;

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;

    let ledger = LedgerConfig::from_env()?;
    let gateway = GatewayConfig::from_env()?;

    Ok(ServiceConfig { port, database_url, ledger, gateway })
}
