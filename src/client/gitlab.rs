//! GitLab backend for the source-control contract

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{
    api::GitlabApi,
    config::ClientConfig,
    error::{ClientError, Result},
};
use crate::{
    domain::{ChangedFile, FileContentDto, FileEncoding, FileListingEntry},
    id::{MergeRequestIid, ProjectId},
    scm::{Repo, ScmClient},
};

/// GitLab client bound to a single project
///
/// Holds only immutable configuration; share it behind an `Arc` across tasks.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    api: Arc<GitlabApi>,
    project_id: ProjectId,
    correlation_id: Uuid,
}

impl GitLabClient {
    /// Create a client for `repo` on the GitLab instance at `base_url`
    pub async fn new(
        ctx: &CancellationToken,
        correlation_id: Uuid,
        base_url: &str,
        access_token: &str,
        repo: Repo,
    ) -> Result<Self> {
        let config = ClientConfig::new(base_url, access_token);
        Self::from_config(ctx, correlation_id, config, repo).await
    }

    /// Create a client from a full configuration
    ///
    /// No request is made when `repo.uid` is a numeric project id. Otherwise
    /// the project is looked up once by its `namespace/name` path.
    #[instrument(skip(ctx, config, repo), fields(correlation_id = %correlation_id, repo = %repo.slug))]
    pub async fn from_config(
        ctx: &CancellationToken,
        correlation_id: Uuid,
        config: ClientConfig,
        repo: Repo,
    ) -> Result<Self> {
        if ctx.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let api = GitlabApi::new(config)?;
        let project_id = Self::resolve_project_id(&api, ctx, &repo).await?;
        debug!(project_id = %project_id, "GitLab client ready");

        Ok(Self {
            api: Arc::new(api),
            project_id,
            correlation_id,
        })
    }

    async fn resolve_project_id(
        api: &GitlabApi,
        ctx: &CancellationToken,
        repo: &Repo,
    ) -> Result<ProjectId> {
        if let Some(project_id) = ProjectId::parse(&repo.uid) {
            return Ok(project_id);
        }

        let Some(path) = repo.full_path() else {
            return Err(ClientError::config(format!(
                "repository uid {:?} is not a project id and no namespace/name is set",
                repo.uid
            )));
        };

        info!(path = %path, "Resolving GitLab project id");
        match api.get_project(ctx, &path).await {
            Ok(project) => {
                debug!(project_id = %project.id, path = %project.path_with_namespace, "Resolved project");
                Ok(project.id)
            },
            Err(ClientError::NotFound { .. }) => {
                Err(ClientError::config(format!("GitLab project {path} not found")))
            },
            Err(e) => Err(e),
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Fetch the raw content of a file at a revision
    #[instrument(skip(self, ctx), fields(correlation_id = %self.correlation_id, project_id = %self.project_id))]
    pub async fn get_file_contents(
        &self,
        ctx: &CancellationToken,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>> {
        let path = path.trim_start_matches('/');

        let content = self
            .api
            .get_file(ctx, self.project_id, path, git_ref)
            .await
            .and_then(|file| decode_content(file, git_ref));

        match content {
            Ok(bytes) => {
                debug!(size = bytes.len(), "Fetched file contents");
                Ok(bytes)
            },
            Err(e) if e.is_not_found() => {
                debug!("File not present at revision");
                Err(e)
            },
            Err(e) => {
                error!(error = %e, "Failed to fetch file contents");
                Err(e)
            },
        }
    }

    /// List a directory at a revision, following every page
    #[instrument(skip(self, ctx), fields(correlation_id = %self.correlation_id, project_id = %self.project_id))]
    pub async fn get_file_listing(
        &self,
        ctx: &CancellationToken,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<FileListingEntry>> {
        let path = path.trim_matches('/');

        match self.fetch_all_tree_pages(ctx, path, git_ref).await {
            Ok(entries) => {
                debug!(entry_count = entries.len(), "Fetched file listing");
                Ok(entries)
            },
            Err(e) => {
                error!(error = %e, "Failed to fetch file listing");
                Err(e)
            },
        }
    }

    async fn fetch_all_tree_pages(
        &self,
        ctx: &CancellationToken,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<FileListingEntry>> {
        let max_pages = self.api.config().request.max_pages;

        let mut entries = Vec::new();
        let mut page = 1;
        let mut fetched = 0;

        loop {
            let (batch, pagination) = self
                .api
                .get_tree_page(ctx, self.project_id, path, git_ref, page)
                .await?;
            fetched += 1;
            entries.extend(batch.into_iter().map(FileListingEntry::from));

            let Some(next_page) = pagination.next_page else {
                break;
            };

            if next_page <= page || fetched >= max_pages {
                warn!(page, next_page, fetched, max_pages, "Aborting runaway pagination");
                return Err(ClientError::pagination_limit(
                    format!("directory {path} at {git_ref}"),
                    fetched,
                ));
            }
            page = next_page;
        }

        Ok(entries)
    }

    /// List the files that differ between two revisions
    #[instrument(skip(self, ctx), fields(correlation_id = %self.correlation_id, project_id = %self.project_id))]
    pub async fn changed_files_in_diff(
        &self,
        ctx: &CancellationToken,
        from: &str,
        to: &str,
    ) -> Result<Vec<ChangedFile>> {
        match self.api.get_compare(ctx, self.project_id, from, to).await {
            Ok(compare) => {
                if compare.compare_timeout {
                    warn!("GitLab timed out comparing revisions, changes may be incomplete");
                }
                if compare.compare_same_ref {
                    debug!("Compared identical revisions");
                }

                let files: Vec<ChangedFile> =
                    compare.diffs.into_iter().map(ChangedFile::from).collect();
                debug!(file_count = files.len(), "Fetched comparison");
                Ok(files)
            },
            Err(e) => {
                error!(error = %e, "Failed to compare revisions");
                Err(e)
            },
        }
    }

    /// List the files changed by a merge request
    #[instrument(skip(self, ctx), fields(correlation_id = %self.correlation_id, project_id = %self.project_id, iid = %iid))]
    pub async fn changed_files_in_merge_request(
        &self,
        ctx: &CancellationToken,
        iid: MergeRequestIid,
    ) -> Result<Vec<ChangedFile>> {
        match self.api.get_merge_request_changes(ctx, self.project_id, iid).await {
            Ok(merge_request) => {
                if merge_request.overflow {
                    warn!("GitLab truncated the merge request changes");
                }

                let files: Vec<ChangedFile> = merge_request
                    .changes
                    .into_iter()
                    .map(ChangedFile::from)
                    .collect();
                debug!(file_count = files.len(), "Fetched merge request changes");
                Ok(files)
            },
            Err(e) => {
                error!(error = %e, "Failed to fetch merge request changes");
                Err(e)
            },
        }
    }
}

#[async_trait]
impl ScmClient for GitLabClient {
    async fn get_file_contents(
        &self,
        ctx: &CancellationToken,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>> {
        GitLabClient::get_file_contents(self, ctx, path, git_ref).await
    }

    async fn get_file_listing(
        &self,
        ctx: &CancellationToken,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<FileListingEntry>> {
        GitLabClient::get_file_listing(self, ctx, path, git_ref).await
    }

    async fn changed_files_in_diff(
        &self,
        ctx: &CancellationToken,
        from: &str,
        to: &str,
    ) -> Result<Vec<ChangedFile>> {
        GitLabClient::changed_files_in_diff(self, ctx, from, to).await
    }

    async fn changed_files_in_pull_request(
        &self,
        ctx: &CancellationToken,
        number: u64,
    ) -> Result<Vec<ChangedFile>> {
        self.changed_files_in_merge_request(ctx, MergeRequestIid::new(number))
            .await
    }
}

/// Unwraps the files endpoint envelope into raw bytes
fn decode_content(file: FileContentDto, git_ref: &str) -> Result<Vec<u8>> {
    let resource = || format!("file {} at {git_ref}", file.file_path);

    match file.encoding {
        FileEncoding::Base64 => {
            // tolerate line-wrapped payloads
            let payload: String = file.content.split_ascii_whitespace().collect();
            base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| ClientError::decode(resource(), e))
        },
        FileEncoding::Text => Ok(file.content.into_bytes()),
        FileEncoding::Unknown => {
            Err(ClientError::decode(resource(), "unsupported content encoding"))
        },
    }
}
