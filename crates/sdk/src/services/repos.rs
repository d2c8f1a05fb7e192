//! Repository service
//!
//! Datasets and Spaces: existence checks, creation, commits, listing and
//! downloads.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use tracing::debug;

use crate::client::Client;
use crate::error::SdkResult;
use crate::models::{CommitFile, CommitInfo, CreateRepoRequest, RepoFile, RepoId, RepoInfo, RepoKind};

/// Branch every operation targets
pub const DEFAULT_REVISION: &str = "main";

/// Service for repository operations
#[derive(Clone)]
pub struct RepoService {
    client: Client,
}

impl RepoService {
    /// Create a new repository service
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Repository metadata, `None` when it does not exist
    pub async fn info(&self, kind: RepoKind, repo: &RepoId) -> SdkResult<Option<RepoInfo>> {
        let path = format!("/api/{}/{}", kind.api_segment(), repo);
        match self.client.get::<RepoInfo>(&path).await {
            Ok(info) => Ok(Some(info)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create a repository.
    ///
    /// Returns `false` when the repository already existed.
    pub async fn create(&self, kind: RepoKind, repo: &RepoId, private: bool) -> SdkResult<bool> {
        let request = CreateRepoRequest {
            kind,
            name: repo.name().to_string(),
            organization: repo.namespace().to_string(),
            private,
            sdk: (kind == RepoKind::Space).then(|| "docker".to_string()),
        };

        match self
            .client
            .post::<serde_json::Value, _>("/api/repos/create", &request)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_conflict() => {
                debug!("{} {} already exists", kind, repo);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Add or replace files in a single commit on `main`
    pub async fn commit(
        &self,
        kind: RepoKind,
        repo: &RepoId,
        files: &[CommitFile],
        summary: &str,
    ) -> SdkResult<CommitInfo> {
        let path = format!(
            "/api/{}/{}/commit/{}",
            kind.api_segment(),
            repo,
            DEFAULT_REVISION
        );
        self.client
            .post_ndjson(&path, commit_payload(files, summary))
            .await
    }

    /// Add or replace one file
    pub async fn upload_file(
        &self,
        kind: RepoKind,
        repo: &RepoId,
        path_in_repo: &str,
        content: impl Into<Vec<u8>>,
        summary: &str,
    ) -> SdkResult<CommitInfo> {
        let file = CommitFile::new(path_in_repo, content);
        self.commit(kind, repo, std::slice::from_ref(&file), summary)
            .await
    }

    /// Files under `prefix` (recursive), across every page of the listing.
    ///
    /// An absent folder yields an empty list.
    pub async fn list_files(
        &self,
        kind: RepoKind,
        repo: &RepoId,
        prefix: &str,
    ) -> SdkResult<Vec<RepoFile>> {
        let mut path = format!("/api/{}/{}/tree/{}", kind.api_segment(), repo, DEFAULT_REVISION);
        let prefix = prefix.trim_matches('/');
        if !prefix.is_empty() {
            path.push('/');
            path.push_str(prefix);
        }
        match self
            .client
            .get_all_pages::<RepoFile, _>(&path, &[("recursive", "true")])
            .await
        {
            Ok(entries) => Ok(entries.into_iter().filter(RepoFile::is_file).collect()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Raw content of a file on `main`
    pub async fn download(&self, kind: RepoKind, repo: &RepoId, path_in_repo: &str) -> SdkResult<Vec<u8>> {
        let path = format!(
            "/{}{}/resolve/{}/{}",
            kind.url_prefix(),
            repo,
            DEFAULT_REVISION,
            path_in_repo
        );
        self.client.get_bytes(&path).await
    }
}

/// NDJSON body of the commit endpoint: a header line, then one line per file
fn commit_payload(files: &[CommitFile], summary: &str) -> String {
    let mut lines = Vec::with_capacity(files.len() + 1);
    lines.push(
        json!({
            "key": "header",
            "value": { "summary": summary, "description": "" }
        })
        .to_string(),
    );
    for file in files {
        lines.push(
            json!({
                "key": "file",
                "value": {
                    "content": BASE64.encode(&file.content),
                    "path": file.path,
                    "encoding": "base64"
                }
            })
            .to_string(),
        );
    }
    lines.join("\n")
}
