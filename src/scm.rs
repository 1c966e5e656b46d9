//! Source-control backend contract shared by all providers.
//!
//! The plugin only needs four read operations from a forge: fetch a file,
//! list a directory, and list the files changed by a comparison or a pull
//! request. Backends implement [`ScmClient`] and are used as trait objects
//! so the provider can be picked at configuration time.

use async_trait::async_trait;
use compact_str::{format_compact, CompactString};
use derive_builder::Builder;
use tokio_util::sync::CancellationToken;

use crate::{
    client::Result,
    domain::{ChangedFile, FileListingEntry},
};

/// The repository a client is bound to
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
#[builder(setter(into), default)]
pub struct Repo {
    /// Provider-side id; for GitLab the numeric project id
    pub uid: CompactString,
    pub namespace: CompactString,
    pub name: CompactString,
    /// `namespace/name`
    pub slug: CompactString,
}

impl Repo {
    pub fn builder() -> RepoBuilder {
        RepoBuilder::default()
    }

    /// The `namespace/name` path, preferring the slug when set
    pub fn full_path(&self) -> Option<CompactString> {
        if !self.slug.is_empty() {
            Some(self.slug.clone())
        } else if !self.namespace.is_empty() && !self.name.is_empty() {
            Some(format_compact!("{}/{}", self.namespace, self.name))
        } else {
            None
        }
    }
}

#[async_trait]
pub trait ScmClient: Send + Sync {
    /// Raw bytes of `path` at `git_ref`. A missing file is
    /// [`ClientError::NotFound`](crate::client::ClientError::NotFound).
    async fn get_file_contents(
        &self,
        ctx: &CancellationToken,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>>;

    /// Immediate children of `path` at `git_ref`, in server order.
    async fn get_file_listing(
        &self,
        ctx: &CancellationToken,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<FileListingEntry>>;

    /// Files that differ between two revisions.
    async fn changed_files_in_diff(
        &self,
        ctx: &CancellationToken,
        from: &str,
        to: &str,
    ) -> Result<Vec<ChangedFile>>;

    /// Files changed by a pull (merge) request.
    async fn changed_files_in_pull_request(
        &self,
        ctx: &CancellationToken,
        number: u64,
    ) -> Result<Vec<ChangedFile>>;
}
