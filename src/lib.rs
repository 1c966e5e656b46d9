//! GitLab repository access for Drone configuration plugins.
//!
//! [`GitLabClient`] reads files, directory listings and changed-file sets
//! from a single GitLab project through the REST API. Callers depend on the
//! provider-neutral [`ScmClient`] trait.

pub mod client;
pub mod config;
pub mod domain;
pub mod id;
pub mod logging;
pub mod result;
pub mod scm;

pub use client::{ClientConfig, ClientError, GitLabClient};
pub use scm::{Repo, ScmClient};
