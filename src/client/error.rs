//! Error types for GitLab client operations

use std::time::Duration;

use compact_str::CompactString;
use thiserror::Error;

/// Structured error types for GitLab client operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Failed to decode {resource}: {message}")]
    Decode { resource: String, message: String },

    /// GitLab API returned an error response
    #[error("GitLab API error (HTTP {status}) for {resource}: {message}")]
    GitlabApi { status: u16, resource: String, message: CompactString },

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration field validation failed
    #[error("Invalid {field}: {message}")]
    ConfigValidation { field: String, message: String },

    /// Token is missing, invalid or expired
    #[error("Authentication failed for {resource}")]
    Unauthorized { resource: String },

    /// Token is valid but lacks access or scope
    #[error("Access forbidden: {resource}")]
    Forbidden { resource: String },

    /// Resource not found
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded for {resource}, retry after {retry_after:?}")]
    RateLimit { resource: String, retry_after: Option<Duration> },

    /// The caller cancelled the operation
    #[error("Request cancelled")]
    Cancelled,

    /// The server kept announcing further pages
    #[error("Pagination of {resource} aborted after {pages} pages")]
    PaginationLimit { resource: String, pages: u32 },
}

impl ClientError {
    /// Create a decode error with resource context
    pub fn decode(resource: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    /// Create a GitLab API error
    pub fn gitlab_api(
        status: u16,
        resource: impl Into<String>,
        message: impl Into<CompactString>,
    ) -> Self {
        Self::GitlabApi { status, resource: resource.into(), message: message.into() }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a configuration field validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation { field: field.into(), message: message.into() }
    }

    /// Create an authentication error
    pub fn unauthorized(resource: impl Into<String>) -> Self {
        Self::Unauthorized { resource: resource.into() }
    }

    /// Create a forbidden error
    pub fn forbidden(resource: impl Into<String>) -> Self {
        Self::Forbidden { resource: resource.into() }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a rate limit error
    pub fn rate_limit(resource: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimit { resource: resource.into(), retry_after }
    }

    pub fn pagination_limit(resource: impl Into<String>, pages: u32) -> Self {
        Self::PaginationLimit { resource: resource.into(), pages }
    }

    /// Check if the resource was absent, e.g. a missing `.drone.yml`
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// Check if the token was rejected
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. } | ClientError::Forbidden { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            ClientError::RateLimit { .. } => true,
            ClientError::GitlabApi { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
