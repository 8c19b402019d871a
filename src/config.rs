use crate::application::poller::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::error::{CheckoutError, Result};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1/public";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for talking to the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Base URL of the public checkout API, without a trailing slash.
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    /// Per-request timeout for every HTTP call.
    pub request_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl CheckoutConfig {
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Checks the settings before any request is made.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CheckoutError::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(CheckoutError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.max_poll_attempts == 0 {
            return Err(CheckoutError::Config(
                "max poll attempts must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(CheckoutError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
