//! Error types for the event gateway

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unknown sport: {0}")]
    UnknownSport(String),

    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status} for {endpoint}")]
    BadStatus { endpoint: String, status: u16 },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}
