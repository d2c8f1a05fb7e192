//! SDK error types
//!
//! This module defines the error types used throughout the SDK.

use thiserror::Error;

/// Result type alias for SDK operations
pub type SdkResult<T> = Result<T, SdkError>;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Token missing, invalid or expired
    #[error("Authentication failed: {message}")]
    Unauthorized {
        /// Error message
        message: String,
        /// HTTP status code
        status_code: u16,
    },

    /// Token valid but lacks permission on the resource
    #[error("Access forbidden: {message}")]
    Forbidden {
        /// Error message
        message: String,
    },

    /// Resource was not found
    #[error("Resource not found: {resource}: {message}")]
    NotFound {
        /// Path or id of the resource
        resource: String,
        /// Error message
        message: String,
    },

    /// Conflict with an existing resource (e.g. repository already exists)
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message
        message: String,
    },

    /// Rate limit or quota exceeded
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        /// Error message
        message: String,
    },

    /// Request timeout
    #[error("Request timed out after {duration:?}")]
    Timeout {
        /// Configured request timeout
        duration: std::time::Duration,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        /// Error message
        message: String,
        /// Underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Server error
    #[error("Server error ({status_code}): {message}")]
    ServerError {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },

    /// API returned an unexpected response
    #[error("Invalid API response: {message}")]
    InvalidResponse {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Error message
        message: String,
    },

    /// Any other 4xx answer, e.g. an invalid flavor
    #[error("API error ({status_code}): {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
}

impl SdkError {
    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SdkError::Unauthorized { status_code, .. } => Some(*status_code),
            SdkError::Forbidden { .. } => Some(403),
            SdkError::NotFound { .. } => Some(404),
            SdkError::Conflict { .. } => Some(409),
            SdkError::RateLimited { .. } => Some(429),
            SdkError::ServerError { status_code, .. } => Some(*status_code),
            SdkError::ApiError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Whether the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, SdkError::NotFound { .. })
    }

    /// Whether the resource already exists
    pub fn is_conflict(&self) -> bool {
        matches!(self, SdkError::Conflict { .. })
    }

    /// Map a transport failure; `timeout` is the client's configured timeout
    pub fn transport(err: reqwest::Error, timeout: std::time::Duration) -> Self {
        if err.is_timeout() {
            SdkError::Timeout { duration: timeout }
        } else if err.is_connect() {
            SdkError::NetworkError {
                message: format!("Connection failed: {}", err),
                source: Some(Box::new(err)),
            }
        } else if err.is_decode() {
            SdkError::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            SdkError::NetworkError {
                message: err.to_string(),
                source: Some(Box::new(err)),
            }
        }
    }

    /// Map a non-success HTTP status and body message to an error
    pub fn from_status(status_code: u16, resource: &str, message: String) -> Self {
        match status_code {
            401 => SdkError::Unauthorized {
                message,
                status_code,
            },
            403 => SdkError::Forbidden { message },
            404 => SdkError::NotFound {
                resource: resource.to_string(),
                message,
            },
            409 => SdkError::Conflict { message },
            429 => SdkError::RateLimited { message },
            500..=599 => SdkError::ServerError {
                status_code,
                message,
            },
            _ => SdkError::ApiError {
                status_code,
                message,
            },
        }
    }
}

/// Convert from JSON errors
impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::InvalidResponse {
            message: err.to_string(),
        }
    }
}
