//! EventGateway - multi-provider sports event data client
//!
//! Fans requests out to API-SPORTS (football, basketball, volleyball, hockey,
//! MMA, boxing, Formula 1) and PandaScore (CS2), applies each sport's date
//! window, and hands back provider payloads as opaque JSON. The wagering core
//! never interprets these payloads; it only records the `sport`/`event_id`
//! strings a caller picked out of them.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod sport;

pub use client::EventGatewayClient;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use models::ProviderPayload;
pub use sport::Sport;

// Result type alias
pub type Result<T> = std::result::Result<T, GatewayError>;
