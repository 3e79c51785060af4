//! Shared HTTP client construction.

use crate::error::{HarvestError, Result};
use reqwest::Client;
use std::time::Duration;

/// User agent sent to every remote service
pub const USER_AGENT: &str = concat!("paperharvest/", env!("CARGO_PKG_VERSION"));

/// Request timeout applied to every client
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a client with the given user agent and timeout.
///
/// Builder failures are configuration errors, never network errors.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| HarvestError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Client with the crate-wide defaults
pub fn default_client() -> Result<Client> {
    build_client(USER_AGENT, REQUEST_TIMEOUT)
}
