use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::result::{AppError, Result};

/// Settings for the `drone-scm` command line tool
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScmConfig {
    /// The URL of the GitLab instance
    pub gitlab_url: String,
    /// The Personal Access Token to authenticate with GitLab
    pub gitlab_token: String,
    /// Numeric project id or `namespace/name` path
    pub project: Option<String>,
    /// Items per page for directory listings
    pub per_page: Option<u32>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Log level (Off, Error, Warn, Info, Debug, Trace)
    pub log_level: Option<String>,
}

impl ScmConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.gitlab_url.trim().is_empty() {
            return Err("gitlab_url is required".to_string());
        }
        if self.gitlab_token.trim().is_empty() {
            return Err("gitlab_token is required".to_string());
        }
        if let Some(per_page) = self.per_page {
            if !(1..=100).contains(&per_page) {
                return Err(format!("per_page must be between 1 and 100, got {per_page}"));
            }
        }
        if self.timeout_secs == Some(0) {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("drone-scm.toml")
    } else {
        PathBuf::from("drone-scm.toml")
    }
}

/// Reads the config file, falling back to defaults when it does not exist
pub fn load_config(config_file: &Path) -> Result<ScmConfig> {
    if !config_file.exists() {
        return Ok(ScmConfig::default());
    }

    confy::load_path(config_file).map_err(AppError::ConfigError)
}
