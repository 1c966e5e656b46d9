use compact_str::CompactString;
use confy::ConfyError;
use thiserror::Error;

use crate::client::ClientError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failure reading configuration file.")]
    ConfigError(#[source] ConfyError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(CompactString),
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{0}")]
    GeneralError(CompactString),
}

impl AppError {
    /// Process exit code: 2 when the requested resource does not exist
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Client(e) if e.is_not_found() => 2,
            _ => 1,
        }
    }
}
