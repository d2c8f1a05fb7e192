//! Hub adapter
//!
//! Implements the application ports over the HTTP SDK. SDK failures become
//! [`RemoteError`]s carrying the status code and the hub's message verbatim.

use async_trait::async_trait;
use evaljobs_application::ports::{
    HostingPort, JobPort, JobSubmission, RemoteError, RemoteJob, RemoteResult,
};
use evaljobs_domain::{BundleFile, RepoId, RepoKind};
use evaljobs_sdk::services::uv_job_spec;
use evaljobs_sdk::{Client, CommitFile, JobInfo, SdkError};
use tracing::debug;

/// Ports implementation backed by [`Client`]
#[derive(Clone)]
pub struct HubAdapter {
    client: Client,
    private: bool,
}

impl HubAdapter {
    /// Adapter creating public repositories
    pub fn new(client: Client) -> Self {
        Self {
            client,
            private: false,
        }
    }

    /// Create new repositories as private
    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    fn remote_job(&self, info: JobInfo) -> RemoteJob {
        RemoteJob {
            url: info.url(self.client.endpoint()),
            id: info.id,
            namespace: info.owner.name,
            stage: info.status.stage,
            message: info.status.message,
            command: info.command,
        }
    }
}

/// Map an SDK failure onto a port failure, keeping the remote message
pub fn remote_error(err: SdkError) -> RemoteError {
    let status_code = err.status_code();
    let message = match err {
        SdkError::Unauthorized { message, .. }
        | SdkError::Forbidden { message }
        | SdkError::Conflict { message }
        | SdkError::RateLimited { message }
        | SdkError::ServerError { message, .. }
        | SdkError::ApiError { message, .. }
        | SdkError::InvalidResponse { message }
        | SdkError::ConfigError { message }
        | SdkError::NetworkError { message, .. } => message,
        SdkError::NotFound { resource, message } if message.trim().is_empty() => {
            format!("{} not found", resource)
        }
        SdkError::NotFound { message, .. } => message,
        other @ SdkError::Timeout { .. } => other.to_string(),
    };
    RemoteError {
        status_code,
        message,
    }
}

#[async_trait]
impl HostingPort for HubAdapter {
    fn endpoint(&self) -> String {
        self.client.endpoint().to_string()
    }

    async fn whoami(&self) -> RemoteResult<String> {
        let me = self.client.whoami().await.map_err(remote_error)?;
        debug!("Token belongs to {}", me.name);
        Ok(me.name)
    }

    async fn repo_exists(&self, kind: RepoKind, repo: &RepoId) -> RemoteResult<bool> {
        self.client
            .repos()
            .info(kind, repo)
            .await
            .map(|info| info.is_some())
            .map_err(remote_error)
    }

    async fn create_repo(&self, kind: RepoKind, repo: &RepoId) -> RemoteResult<bool> {
        self.client
            .repos()
            .create(kind, repo, self.private)
            .await
            .map_err(remote_error)
    }

    async fn duplicate_space(&self, from: &RepoId, to: &RepoId) -> RemoteResult<()> {
        self.client
            .spaces()
            .duplicate(from, to, self.private)
            .await
            .map_err(remote_error)
    }

    async fn set_space_variable(&self, space: &RepoId, key: &str, value: &str) -> RemoteResult<()> {
        self.client
            .spaces()
            .set_variable(space, key, value)
            .await
            .map_err(remote_error)
    }

    async fn commit(
        &self,
        kind: RepoKind,
        repo: &RepoId,
        files: &[BundleFile],
        summary: &str,
    ) -> RemoteResult<()> {
        let files: Vec<CommitFile> = files
            .iter()
            .map(|f| CommitFile::new(f.path.as_str(), f.content.as_slice()))
            .collect();
        let info = self
            .client
            .repos()
            .commit(kind, repo, &files, summary)
            .await
            .map_err(remote_error)?;
        if let Some(url) = info.commit_url {
            debug!("Committed {}", url);
        }
        Ok(())
    }

    async fn list_files(&self, kind: RepoKind, repo: &RepoId, prefix: &str) -> RemoteResult<Vec<String>> {
        let files = self
            .client
            .repos()
            .list_files(kind, repo, prefix)
            .await
            .map_err(remote_error)?;
        Ok(files.into_iter().map(|f| f.path).collect())
    }

    async fn download(&self, kind: RepoKind, repo: &RepoId, path: &str) -> RemoteResult<Vec<u8>> {
        self.client
            .repos()
            .download(kind, repo, path)
            .await
            .map_err(remote_error)
    }
}

#[async_trait]
impl JobPort for HubAdapter {
    async fn submit(&self, submission: &JobSubmission) -> RemoteResult<RemoteJob> {
        let spec = uv_job_spec(
            &submission.script_url,
            &submission.script_args,
            submission.flavor,
            Some(submission.timeout_secs),
            submission.secrets.clone(),
        );
        let info = self
            .client
            .jobs()
            .run(&submission.namespace, &spec)
            .await
            .map_err(remote_error)?;
        Ok(self.remote_job(info))
    }

    async fn status(&self, namespace: &str, job_id: &str) -> RemoteResult<RemoteJob> {
        let info = self
            .client
            .jobs()
            .get(namespace, job_id)
            .await
            .map_err(remote_error)?;
        Ok(self.remote_job(info))
    }

    async fn logs(&self, namespace: &str, job_id: &str) -> RemoteResult<Vec<String>> {
        let lines = self
            .client
            .jobs()
            .logs(namespace, job_id)
            .await
            .map_err(remote_error)?;
        Ok(lines.into_iter().map(|l| l.data).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_keeps_message() {
        let err = remote_error(SdkError::from_status(
            402,
            "/api/jobs/alice",
            "Pre-paid credit balance is insufficient".into(),
        ));
        assert_eq!(err.status_code, Some(402));
        assert_eq!(err.message, "Pre-paid credit balance is insufficient");

        let err = remote_error(SdkError::from_status(404, "datasets/alice/x", String::new()));
        assert_eq!(err.status_code, Some(404));
        assert_eq!(err.message, "datasets/alice/x not found");
    }

    #[test]
    fn test_not_found_keeps_hub_message() {
        let err = remote_error(SdkError::from_status(
            404,
            "/api/jobs/bob",
            "Namespace bob not accessible with this token".into(),
        ));
        assert_eq!(err.status_code, Some(404));
        assert_eq!(err.message, "Namespace bob not accessible with this token");
    }

    #[test]
    fn test_timeout_has_no_status() {
        let err = remote_error(SdkError::Timeout {
            duration: std::time::Duration::from_secs(60),
        });
        assert_eq!(err.status_code, None);
        assert!(err.message.contains("timed out"));
    }
}
