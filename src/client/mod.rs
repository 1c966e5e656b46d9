//! GitLab client modules
//!
//! `api` is the pure HTTP layer; `gitlab` binds it to a project and
//! implements the [`ScmClient`](crate::scm::ScmClient) contract.

pub mod api;
pub mod config;
pub mod error;
pub mod gitlab;
pub mod pagination;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use api::GitlabApi;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use gitlab::GitLabClient;
pub use pagination::PaginationInfo;
