//! Betting service - HTTP binding for the wager ledger and event gateway
//!
//! Binds the transaction coordinator and query service to REST routes,
//! proxies the sports data endpoints through the event gateway, and owns
//! process concerns: configuration, logging, graceful shutdown.

pub mod config;
pub mod logging;
pub mod routes;

pub use config::{load_config, ServiceConfig};
pub use logging::initialize_logging;
pub use routes::{routes, AppContext};
