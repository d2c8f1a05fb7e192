//! Ports to the remote collaborators.
//!
//! The pipeline talks to the hosting service and the job service only through
//! these traits. The CLI implements them over the HTTP SDK; tests use the
//! in-memory fakes from `evaljobs-testing`.

use async_trait::async_trait;
use evaljobs_domain::{BundleFile, HardwareFlavor, JobStage, RepoId, RepoKind};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Failure reported by a remote service, message kept verbatim
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    /// HTTP status, when the failure came from an answer
    pub status_code: Option<u16>,
    /// Remote or transport message
    pub message: String,
}

impl RemoteError {
    /// Error without a status code (transport failure)
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
        }
    }

    /// Error carrying the HTTP status of the answer
    pub fn with_status(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            message: message.into(),
        }
    }
}

/// Result of a port call
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A job to submit: `uv run <script_url> <script_args...>`
#[derive(Clone, PartialEq, Eq)]
pub struct JobSubmission {
    /// Namespace the job is billed to
    pub namespace: String,
    /// URL of the script the job runs
    pub script_url: String,
    /// Arguments after the script URL
    pub script_args: Vec<String>,
    /// Compute tier
    pub flavor: HardwareFlavor,
    /// Remote timeout in seconds
    pub timeout_secs: u64,
    /// Encrypted environment variables
    pub secrets: BTreeMap<String, String>,
}

impl fmt::Debug for JobSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSubmission")
            .field("namespace", &self.namespace)
            .field("script_url", &self.script_url)
            .field("script_args", &self.script_args)
            .field("flavor", &self.flavor)
            .field("timeout_secs", &self.timeout_secs)
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Snapshot of a remote job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJob {
    /// Job identifier
    pub id: String,
    /// Owner namespace
    pub namespace: String,
    /// Lifecycle stage
    pub stage: JobStage,
    /// Status message, usually set on failure
    pub message: Option<String>,
    /// Browser URL
    pub url: String,
    /// Entrypoint and arguments the job runs
    pub command: Vec<String>,
}

impl RemoteJob {
    /// Models argument of an evaljobs job (`uv run <runner> <eval> <models> ...`)
    pub fn models_arg(&self) -> Option<&str> {
        match self.command.as_slice() {
            [uv, run, _runner, _eval, models, ..] if uv == "uv" && run == "run" => Some(models.as_str()),
            _ => None,
        }
    }
}

/// Repository hosting (datasets and Spaces)
#[async_trait]
pub trait HostingPort: Send + Sync {
    /// Base URL used to build browser and `resolve` URLs
    fn endpoint(&self) -> String;

    /// Name of the account the token belongs to
    async fn whoami(&self) -> RemoteResult<String>;

    /// Whether the repository exists
    async fn repo_exists(&self, kind: RepoKind, repo: &RepoId) -> RemoteResult<bool>;

    /// Create a repository; `false` when it already existed
    async fn create_repo(&self, kind: RepoKind, repo: &RepoId) -> RemoteResult<bool>;

    /// Duplicate a Space (code, settings and hardware) into `to`
    async fn duplicate_space(&self, from: &RepoId, to: &RepoId) -> RemoteResult<()>;

    /// Set a Space variable, replacing any previous value
    async fn set_space_variable(&self, space: &RepoId, key: &str, value: &str) -> RemoteResult<()>;

    /// Add or replace files in one commit
    async fn commit(
        &self,
        kind: RepoKind,
        repo: &RepoId,
        files: &[BundleFile],
        summary: &str,
    ) -> RemoteResult<()>;

    /// Paths of the files under `prefix`, recursively
    async fn list_files(&self, kind: RepoKind, repo: &RepoId, prefix: &str) -> RemoteResult<Vec<String>>;

    /// Raw content of a file
    async fn download(&self, kind: RepoKind, repo: &RepoId, path: &str) -> RemoteResult<Vec<u8>>;
}

/// Remote job execution
#[async_trait]
pub trait JobPort: Send + Sync {
    /// Submit a job
    async fn submit(&self, submission: &JobSubmission) -> RemoteResult<RemoteJob>;

    /// Current state of a job
    async fn status(&self, namespace: &str, job_id: &str) -> RemoteResult<RemoteJob>;

    /// Console output of a job, one entry per line
    async fn logs(&self, namespace: &str, job_id: &str) -> RemoteResult<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_debug_hides_secrets() {
        let submission = JobSubmission {
            namespace: "alice".into(),
            script_url: "https://hub/runner.py".into(),
            script_args: vec![],
            flavor: HardwareFlavor::CpuBasic,
            timeout_secs: 1800,
            secrets: BTreeMap::from([("HF_TOKEN".to_string(), "hf_secret".to_string())]),
        };
        let debug = format!("{:?}", submission);
        assert!(debug.contains("HF_TOKEN"));
        assert!(!debug.contains("hf_secret"));
    }

    #[test]
    fn test_models_arg() {
        let mut job = RemoteJob {
            id: "j1".into(),
            namespace: "alice".into(),
            stage: JobStage::Running,
            message: None,
            url: "https://huggingface.co/jobs/alice/j1".into(),
            command: ["uv", "run", "runner.py", "inspect_evals/gpqa", "a/b,c/d", "datasets/alice/x"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        assert_eq!(job.models_arg(), Some("a/b,c/d"));
        job.command = vec!["python".into(), "train.py".into()];
        assert_eq!(job.models_arg(), None);
    }

    #[test]
    fn test_remote_error_display_is_verbatim() {
        let err = RemoteError::with_status(402, "Pre-paid credit balance is insufficient");
        assert_eq!(err.to_string(), "Pre-paid credit balance is insufficient");
        assert_eq!(err.status_code, Some(402));
    }
}
