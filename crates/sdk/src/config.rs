//! SDK configuration
//!
//! This module provides configuration options for the SDK client.

use crate::error::{SdkError, SdkResult};
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable holding the access token
pub const TOKEN_ENV: &str = "HF_TOKEN";

/// Environment variable overriding the hub endpoint
pub const ENDPOINT_ENV: &str = "HF_ENDPOINT";

/// Client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the hub, without trailing slash
    pub base_url: String,

    /// Access token sent as a bearer token
    pub token: Option<String>,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Enable request/response logging
    pub debug: bool,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: crate::DEFAULT_ENDPOINT.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("evaljobs/{}", crate::VERSION),
            debug: false,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `HF_ENDPOINT`: Base URL of the hub
    /// - `HF_TOKEN`: Access token
    pub fn from_env() -> SdkResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENDPOINT_ENV) {
            config.base_url = url;
        }

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                config.token = Some(token);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable debug logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Base URL with any trailing slash removed
    pub fn endpoint(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Validate the configuration
    pub fn validate(&self) -> SdkResult<()> {
        if self.base_url.is_empty() {
            return Err(SdkError::ConfigError {
                message: "Base URL cannot be empty".to_string(),
            });
        }

        url::Url::parse(&self.base_url).map_err(|e| SdkError::ConfigError {
            message: format!("Invalid base URL '{}': {}", self.base_url, e),
        })?;

        if self.timeout.is_zero() {
            return Err(SdkError::ConfigError {
                message: "Timeout cannot be zero".to_string(),
            });
        }

        Ok(())
    }

    /// Get the authorization header value
    pub fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {}", token))
    }
}
