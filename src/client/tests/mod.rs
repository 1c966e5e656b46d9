//! Test utilities and common test fixtures for client modules

use base64::Engine as _;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wiremock::{Request, Respond, ResponseTemplate};

use crate::{
    client::{config::ClientConfig, gitlab::GitLabClient},
    scm::Repo,
};


pub const MOCK_TOKEN: &str = "7535706b694c63526c6e4f5230374243";
pub const PROJECT_PATH: &str = "/api/v4/projects/1234";
pub const HEAD_SHA: &str = "8ecad91991d5da985a2a8dd97cc19029dc1c2899";
pub const BASE_SHA: &str = "2897b31ec3a1b59279a08a8ad54dc360686327f7";

pub const DRONE_YML: &str = "kind: pipeline\nname: default\n\nsteps:\n- name: build\n  image: golang\n  commands:\n  - go build\n";

/// Repository reference with a known numeric project id
pub fn sample_repo() -> Repo {
    Repo::builder()
        .uid("1234")
        .namespace("foosinn")
        .name("dronetest")
        .slug("foosinn/dronetest")
        .build()
        .unwrap()
}

/// JSON envelope returned by the files endpoint
pub fn file_content_json(file_path: &str, git_ref: &str, content: &str) -> Value {
    let file_name = file_path.rsplit('/').next().unwrap_or(file_path);
    json!({
        "file_name": file_name,
        "file_path": file_path,
        "size": content.len(),
        "encoding": "base64",
        "content": base64::engine::general_purpose::STANDARD.encode(content),
        "content_sha256": "4c294617b60715c1d218e61164a3abd4808a4284cbc30e6728a01ad9aada4481",
        "ref": git_ref,
        "blob_id": "79f7bbd25901e8334750839545a9bd021f0e4e83",
        "commit_id": HEAD_SHA,
        "last_commit_id": BASE_SHA
    })
}

fn tree_entry(kind: &str, path: &str) -> Value {
    let name = path.rsplit('/').next().unwrap_or(path);
    let mode = if kind == "tree" { "040000" } else { "100644" };
    json!({
        "id": "a1e8f8d745cc87e3a9248358d9352bb7f9a0aeba",
        "name": name,
        "type": kind,
        "path": path,
        "mode": mode
    })
}

/// Single-page listing of `afolder`
pub fn afolder_json() -> Value {
    json!([
        tree_entry("blob", "afolder/.drone.yml"),
        tree_entry("blob", "afolder/abfile"),
        tree_entry("tree", "afolder/subfolder"),
    ])
}

/// The 23 entries of `alargefolder`, in server order
pub fn alargefolder_entries() -> Vec<Value> {
    let files = (1..=11).map(|i| tree_entry("blob", &format!("alargefolder/file{i:02}")));
    let folders = (1..=11).map(|i| tree_entry("tree", &format!("alargefolder/folder{i:02}")));

    std::iter::once(tree_entry("blob", "alargefolder/.drone.yml"))
        .chain(files)
        .chain(folders)
        .collect()
}

fn diff_json(old_path: &str, new_path: &str, new_file: bool, renamed: bool, deleted: bool) -> Value {
    json!({
        "old_path": old_path,
        "new_path": new_path,
        "a_mode": if new_file { "0" } else { "100644" },
        "b_mode": if deleted { "0" } else { "100644" },
        "diff": "@@ -1 +1 @@\n-old\n+new\n",
        "new_file": new_file,
        "renamed_file": renamed,
        "deleted_file": deleted
    })
}

/// Compare response for `BASE_SHA...HEAD_SHA`
pub fn compare_json() -> Value {
    json!({
        "commit": { "id": HEAD_SHA, "short_id": "8ecad919", "title": "Add drone config" },
        "commits": [],
        "diffs": [
            diff_json("README.md", "README.md", false, false, false),
            diff_json(".drone.yml", ".drone.yml", true, false, false),
            diff_json("docs/old.md", "docs/new.md", false, true, false),
            diff_json("obsolete.txt", "obsolete.txt", false, false, true),
        ],
        "compare_timeout": false,
        "compare_same_ref": false
    })
}

/// Merge request !3 changes
pub fn merge_request_changes_json() -> Value {
    json!({
        "id": 21,
        "iid": 3,
        "project_id": 1234,
        "title": "Update pipeline",
        "state": "opened",
        "source_branch": "feature",
        "target_branch": "master",
        "changes": [
            diff_json(".drone.yml", ".drone.yml", false, false, false),
            diff_json("afolder/.drone.yml", "afolder/.drone.yml", true, false, false),
        ],
        "overflow": false
    })
}

/// Create GitLab API error response (format 2)
pub fn gitlab_error_response(message: &str) -> Value {
    json!({
        "message": message
    })
}

/// Serves a fixed listing with GitLab's offset pagination headers
pub struct PagedTree {
    entries: Vec<Value>,
}

impl PagedTree {
    pub fn new(entries: Vec<Value>) -> Self {
        Self { entries }
    }
}

impl Respond for PagedTree {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<usize>().ok())
        };
        // GitLab defaults
        let page = param("page").unwrap_or(1).max(1);
        let per_page = param("per_page").unwrap_or(20).max(1);

        let total = self.entries.len();
        let first = ((page - 1) * per_page).min(total);
        let last = (page * per_page).min(total);
        let total_pages = total.div_ceil(per_page);

        let next_page = if last < total { (page + 1).to_string() } else { String::new() };
        let prev_page = if first > 0 { (page - 1).to_string() } else { String::new() };

        ResponseTemplate::new(200)
            .insert_header("x-next-page", next_page)
            .insert_header("x-page", page.to_string())
            .insert_header("x-per-page", per_page.to_string())
            .insert_header("x-prev-page", prev_page)
            .insert_header("x-total", total.to_string())
            .insert_header("x-total-pages", total_pages.to_string())
            .set_body_json(&self.entries[first..last])
    }
}

/// Always announces another page
pub struct EndlessTree;

impl Respond for EndlessTree {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse::<u32>().ok())
            .unwrap_or(1);

        ResponseTemplate::new(200)
            .insert_header("x-next-page", (page + 1).to_string())
            .insert_header("x-page", page.to_string())
            .set_body_json(json!([tree_entry("blob", &format!("loop/file{page}"))]))
    }
}

/// Mock HTTP server for testing
pub struct MockServer {
    pub server: wiremock::MockServer,
}

impl MockServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        let server = wiremock::MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Create a test config pointing to this mock server
    pub fn test_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url(), MOCK_TOKEN)
    }

    /// Create a client for the sample repository
    pub async fn client(&self) -> GitLabClient {
        self.client_with(self.test_config()).await
    }

    pub async fn client_with(&self, config: ClientConfig) -> GitLabClient {
        GitLabClient::from_config(&CancellationToken::new(), Uuid::new_v4(), config, sample_repo())
            .await
            .unwrap()
    }
}

#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_fixtures() {
        let entries = alargefolder_entries();
        assert_eq!(entries.len(), 23);
        assert_eq!(entries[0]["path"], "alargefolder/.drone.yml");
        assert_eq!(entries[12]["type"], "tree");

        let file = file_content_json("afolder/.drone.yml", HEAD_SHA, DRONE_YML);
        assert_eq!(file["file_name"], ".drone.yml");
        assert_eq!(file["encoding"], "base64");
    }
}
