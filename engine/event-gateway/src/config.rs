//! Configuration for the event gateway

use crate::GatewayError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provider credentials and request tuning.
///
/// Credentials are injected here at process start; no module reads them from
/// the environment on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub api_sports_key: String,
    pub pandascore_token: String,
    /// Timezone parameter forwarded to API-SPORTS requests.
    pub timezone: String,
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_sports_key: String::new(),
            pandascore_token: String::new(),
            timezone: "Europe/Kiev".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl GatewayConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_sports_key = std::env::var("API_SPORTS_KEY").map_err(|_| {
            GatewayError::InvalidConfig { message: "API_SPORTS_KEY not set".to_string() }
        })?;

        let pandascore_token = std::env::var("PANDASCORE_TOKEN").map_err(|_| {
            GatewayError::InvalidConfig { message: "PANDASCORE_TOKEN not set".to_string() }
        })?;

        let timezone =
            std::env::var("EVENT_TIMEZONE").unwrap_or_else(|_| "Europe/Kiev".to_string());

        let request_timeout_secs = std::env::var("GATEWAY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u64>()
            .map_err(|_| GatewayError::InvalidConfig {
                message: "Invalid GATEWAY_TIMEOUT_SECS".to_string(),
            })?;

        Ok(Self { api_sports_key, pandascore_token, timezone, request_timeout_secs })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
