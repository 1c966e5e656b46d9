//! Core HTTP client for GitLab API

use std::{future::Future, time::Duration};

use chrono::Local;
use compact_str::{format_compact, CompactString};
use reqwest::{
    header::{HeaderMap, RETRY_AFTER},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

use super::{
    config::ClientConfig,
    error::{ClientError, Result},
    pagination::PaginationInfo,
};
use crate::{
    domain::{CompareDto, FileContentDto, MergeRequestChangesDto, ProjectDto, TreeEntryDto},
    id::{MergeRequestIid, ProjectId},
};

/// Pure HTTP client for GitLab API
#[derive(Debug, Clone)]
pub struct GitlabApi {
    client: Client,
    config: ClientConfig,
    api_url: CompactString,
}

/// GitLab API error response formats
#[derive(Debug, Deserialize)]
struct GitlabApiError {
    error: CompactString,
    error_description: Option<CompactString>,
}

#[derive(Debug, Deserialize)]
struct GitlabApiError2 {
    message: serde_json::Value,
}

impl GitlabApi {
    /// Create a new GitLab API client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request.timeout)
            .build()
            .map_err(ClientError::Http)?;

        let api_url = config.api_url();
        Ok(Self { client, config, api_url })
    }

    /// Look up a project by its `namespace/name` path
    #[instrument(skip(self, ctx))]
    pub async fn get_project(&self, ctx: &CancellationToken, slug: &str) -> Result<ProjectDto> {
        let url = self.build_project_lookup_url(slug);
        self.get_json(ctx, &url, &format!("project {slug}")).await
    }

    /// Get a single file's envelope at a revision
    #[instrument(skip(self, ctx), fields(project_id = %project_id))]
    pub async fn get_file(
        &self,
        ctx: &CancellationToken,
        project_id: ProjectId,
        path: &str,
        git_ref: &str,
    ) -> Result<FileContentDto> {
        let url = self.build_file_url(project_id, path, git_ref);
        self.get_json(ctx, &url, &format!("file {path} at {git_ref}")).await
    }

    /// Get one page of a directory listing
    #[instrument(skip(self, ctx), fields(project_id = %project_id))]
    pub async fn get_tree_page(
        &self,
        ctx: &CancellationToken,
        project_id: ProjectId,
        path: &str,
        git_ref: &str,
        page: u32,
    ) -> Result<(Vec<TreeEntryDto>, PaginationInfo)> {
        let url = self.build_tree_url(project_id, path, git_ref, page);
        let resource = format!("directory {path} at {git_ref}");
        let (entries, headers): (Vec<TreeEntryDto>, _) =
            self.get_json_with_headers(ctx, &url, &resource).await?;

        let pagination = PaginationInfo::from_headers(&headers, &resource)?;
        debug!(
            entry_count = entries.len(),
            page = ?pagination.page,
            next_page = ?pagination.next_page,
            total = ?pagination.total,
            total_pages = ?pagination.total_pages,
            "Fetched tree page"
        );
        Ok((entries, pagination))
    }

    /// Compare two revisions
    #[instrument(skip(self, ctx), fields(project_id = %project_id))]
    pub async fn get_compare(
        &self,
        ctx: &CancellationToken,
        project_id: ProjectId,
        from: &str,
        to: &str,
    ) -> Result<CompareDto> {
        let url = self.build_compare_url(project_id, from, to);
        self.get_json(ctx, &url, &format!("comparison {from}...{to}")).await
    }

    /// Get the diff entries of a merge request
    #[instrument(skip(self, ctx), fields(project_id = %project_id, iid = %iid))]
    pub async fn get_merge_request_changes(
        &self,
        ctx: &CancellationToken,
        project_id: ProjectId,
        iid: MergeRequestIid,
    ) -> Result<MergeRequestChangesDto> {
        let url = self.build_merge_request_changes_url(project_id, iid);
        self.get_json(ctx, &url, &format!("merge request !{iid}")).await
    }

    /// Get current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // Private helper methods

    /// Perform authenticated GET request and deserialize JSON response
    async fn get_json<T>(&self, ctx: &CancellationToken, url: &str, resource: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.get_json_with_headers(ctx, url, resource)
            .await
            .map(|(body, _)| body)
    }

    async fn get_json_with_headers<T>(
        &self,
        ctx: &CancellationToken,
        url: &str,
        resource: &str,
    ) -> Result<(T, HeaderMap)>
    where
        T: for<'de> Deserialize<'de>,
    {
        if ctx.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let response = cancellable(ctx, self.authenticated_request(url).send()).await?;
        self.handle_response(ctx, response, resource).await
    }

    /// Create authenticated request builder
    fn authenticated_request(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("PRIVATE-TOKEN", self.config.private_token.as_str())
    }

    /// Handle HTTP response and deserialize JSON
    async fn handle_response<T>(
        &self,
        ctx: &CancellationToken,
        response: Response,
        resource: &str,
    ) -> Result<(T, HeaderMap)>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let headers = response.headers().clone();
        let body = cancellable(ctx, response.text()).await?;

        // Log response if debug is enabled
        if self.config.debug.log_responses {
            self.log_response_to_file(&url_path, &body);
        }

        if status.is_success() {
            serde_json::from_str(&body)
                .map(|parsed| (parsed, headers))
                .map_err(|e| ClientError::decode(resource, e))
        } else {
            self.handle_error_response(status, &headers, &body, resource)
        }
    }

    /// Handle error responses from GitLab API
    fn handle_error_response<T>(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        body: &str,
        resource: &str,
    ) -> Result<T> {
        match status {
            StatusCode::UNAUTHORIZED => Err(ClientError::unauthorized(resource)),
            StatusCode::FORBIDDEN => Err(ClientError::forbidden(resource)),
            StatusCode::NOT_FOUND => Err(ClientError::not_found(resource)),
            StatusCode::TOO_MANY_REQUESTS => {
                Err(ClientError::rate_limit(resource, retry_after(headers)))
            },
            _ => {
                let status = status.as_u16();
                // Try to parse GitLab API error formats
                if let Ok(api_error) = serde_json::from_str::<GitlabApiError>(body) {
                    Err(ClientError::gitlab_api(
                        status,
                        resource,
                        format_compact!(
                            "{} {}",
                            api_error.error,
                            api_error.error_description.unwrap_or_default()
                        )
                        .trim_end(),
                    ))
                } else if let Ok(api_error2) = serde_json::from_str::<GitlabApiError2>(body) {
                    let message = match api_error2.message {
                        serde_json::Value::String(message) => message,
                        other => other.to_string(),
                    };
                    Err(ClientError::gitlab_api(status, resource, message))
                } else {
                    Err(ClientError::gitlab_api(status, resource, body))
                }
            },
        }
    }

    fn project_url(&self, project_id: ProjectId) -> CompactString {
        format_compact!("{}/projects/{}", self.api_url, project_id)
    }

    /// Build URL for project lookup by path
    fn build_project_lookup_url(&self, slug: &str) -> CompactString {
        format_compact!("{}/projects/{}", self.api_url, encode(slug))
    }

    /// Build URL for the files endpoint; the path is a single segment
    fn build_file_url(&self, project_id: ProjectId, path: &str, git_ref: &str) -> CompactString {
        format_compact!(
            "{}/repository/files/{}?ref={}",
            self.project_url(project_id),
            encode(path),
            encode(git_ref)
        )
    }

    /// Build URL for the tree endpoint
    fn build_tree_url(
        &self,
        project_id: ProjectId,
        path: &str,
        git_ref: &str,
        page: u32,
    ) -> CompactString {
        let mut url = format_compact!("{}/repository/tree?", self.project_url(project_id));

        if !path.is_empty() {
            url.push_str(&format_compact!("path={}&", encode(path)));
        }

        url.push_str(&format_compact!(
            "ref={}&per_page={}&page={}",
            encode(git_ref),
            self.config.request.per_page,
            page
        ));

        url
    }

    /// Build URL for the compare endpoint
    fn build_compare_url(&self, project_id: ProjectId, from: &str, to: &str) -> CompactString {
        format_compact!(
            "{}/repository/compare?from={}&to={}",
            self.project_url(project_id),
            encode(from),
            encode(to)
        )
    }

    /// Build URL for merge request changes
    fn build_merge_request_changes_url(
        &self,
        project_id: ProjectId,
        iid: MergeRequestIid,
    ) -> CompactString {
        format_compact!("{}/merge_requests/{}/changes", self.project_url(project_id), iid)
    }

    /// Log HTTP response to file for debugging
    fn log_response_to_file(&self, path: &str, body: &str) {
        if let Some(log_dir) = &self.config.debug.log_directory {
            if !log_dir.exists() {
                if let Err(e) = std::fs::create_dir_all(log_dir) {
                    warn!("Failed to create log directory: {}", e);
                    return;
                }
            }

            let filename = format!(
                "{}_{}.json",
                Local::now().format("%Y-%m-%d_%H-%M-%S%.3f"),
                path.replace(['/', '%'], "_")
            );

            let log_path = log_dir.join(filename);

            if let Err(e) = std::fs::write(&log_path, body) {
                warn!("Failed to write response log to {:?}: {}", log_path, e);
            } else {
                debug!("Response logged to {:?}", log_path);
            }
        }
    }
}

/// Races a request future against cancellation.
async fn cancellable<T>(
    ctx: &CancellationToken,
    request: impl Future<Output = reqwest::Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ClientError::Cancelled),
        result = request => result.map_err(ClientError::Http),
    }
}

/// Seconds form of `Retry-After`; GitLab does not send the date form.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
