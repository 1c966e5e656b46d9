//! Configuration management for GitLab client

use std::{path::PathBuf, time::Duration};

use compact_str::{format_compact, CompactString};

use super::error::{ClientError, Result};
use crate::config::ScmConfig;

const API_PREFIX: &str = "/api/v4";

/// Main configuration for GitLab client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GitLab instance base URL, with or without the `/api/v4` suffix
    pub base_url: CompactString,
    /// Private access token
    pub private_token: CompactString,
    /// Request configuration
    pub request: RequestConfig,
    /// Debug configuration
    pub debug: DebugConfig,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Number of items per page for paginated requests
    pub per_page: u32,
    /// Request timeout
    pub timeout: Duration,
    /// Upper bound on pages fetched by a single listing
    pub max_pages: u32,
}

/// Debug and logging configuration
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// Enable debug logging of HTTP responses
    pub log_responses: bool,
    /// Directory for storing debug logs
    pub log_directory: Option<PathBuf>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            per_page: 100,
            timeout: Duration::from_secs(30),
            max_pages: 100,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_responses: false,
            log_directory: Some(PathBuf::from("drone-scm-logs")),
        }
    }
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(
        base_url: impl Into<CompactString>,
        private_token: impl Into<CompactString>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            private_token: private_token.into(),
            request: RequestConfig::default(),
            debug: DebugConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::config("Base URL cannot be empty"));
        }

        if self.private_token.is_empty() {
            return Err(ClientError::config("Private token cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::config("Base URL must start with http:// or https://"));
        }

        if self.request.per_page == 0 || self.request.per_page > 100 {
            return Err(ClientError::config_validation("per_page", "must be between 1 and 100"));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config_validation("timeout", "must be greater than zero"));
        }

        if self.request.max_pages == 0 {
            return Err(ClientError::config_validation("max_pages", "must be greater than zero"));
        }

        Ok(())
    }

    /// Root of the REST API, e.g. `https://gitlab.com/api/v4`
    pub fn api_url(&self) -> CompactString {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with(API_PREFIX) {
            base.into()
        } else {
            format_compact!("{base}{API_PREFIX}")
        }
    }
}

impl From<&ScmConfig> for ClientConfig {
    fn from(config: &ScmConfig) -> Self {
        let mut client_config = Self::new(config.gitlab_url.as_str(), config.gitlab_token.as_str());
        if let Some(per_page) = config.per_page {
            client_config = client_config.with_per_page(per_page);
        }
        if let Some(secs) = config.timeout_secs {
            client_config = client_config.with_timeout(Duration::from_secs(secs));
        }
        client_config
    }
}

impl ClientConfig {
    /// Enable debug logging
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug.log_responses = enabled;
        self
    }

    /// Set items per page
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.request.per_page = per_page;
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }
}
