//! Custom error types for paperharvest.
//!
//! All library functions return `Result<T, HarvestError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for paperharvest operations.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from API
        message: String,
    },

    /// Service-account authentication failed
    #[error("Auth error: {0}")]
    Auth(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config file error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `HarvestError`
pub type Result<T> = std::result::Result<T, HarvestError>;

impl HarvestError {
    /// Build an `Api` error from a non-success response status.
    pub fn api(status: reqwest::StatusCode, service: &str, body: &str) -> Self {
        HarvestError::Api {
            code: status.as_u16(),
            message: format!("{} error: {} - {}", service, status, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = HarvestError::api(reqwest::StatusCode::NOT_FOUND, "DBLP", "missing");
        assert_eq!(err.to_string(), "API error: 404 - DBLP error: 404 Not Found - missing");
    }
}
