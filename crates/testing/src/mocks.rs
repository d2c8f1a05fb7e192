//! In-memory hosting and job services.
//!
//! `FakeHub` keeps repositories as path -> bytes maps and runs jobs as a small
//! scripted state machine: a job stays `RUNNING` for a configurable number of
//! status polls, then ends with the configured stage and writes its inspect
//! logs into the dataset named in its arguments.

use async_trait::async_trait;
use evaljobs_application::ports::{
    HostingPort, JobPort, JobSubmission, RemoteError, RemoteJob, RemoteResult,
};
use evaljobs_application::services::DEFAULT_VIEWER_TEMPLATE;
use evaljobs_domain::{BundleFile, JobStage, RepoId, RepoKind};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Endpoint reported by the fake
pub const FAKE_ENDPOINT: &str = "https://hub.test";

/// What a submitted job does
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Status polls answered with `RUNNING` before the final stage
    pub polls_before_end: usize,
    /// Final stage; `None` keeps the job running forever
    pub final_stage: Option<JobStage>,
    /// Status message reported with the final stage
    pub message: Option<String>,
    /// Console output
    pub console: Vec<String>,
    /// `(path, content)` written into the dataset when the job ends
    pub logs: Vec<(String, Vec<u8>)>,
}

impl JobOutcome {
    /// Job that completes and writes `logs`
    pub fn succeeded(logs: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            polls_before_end: 1,
            final_stage: Some(JobStage::Completed),
            message: None,
            console: vec![
                "Downloading eval script...".to_string(),
                "Running: inspect eval".to_string(),
            ],
            logs,
        }
    }

    /// Job that errors after writing `partial_logs`
    pub fn failed(message: impl Into<String>, partial_logs: Vec<(String, Vec<u8>)>) -> Self {
        let message = message.into();
        Self {
            polls_before_end: 1,
            final_stage: Some(JobStage::Error),
            console: vec!["Running: inspect eval".to_string(), message.clone()],
            message: Some(message),
            logs: partial_logs,
        }
    }

    /// Job that never reaches a terminal stage
    pub fn never_finishes() -> Self {
        Self {
            polls_before_end: 0,
            final_stage: None,
            message: None,
            console: vec!["Running: inspect eval".to_string()],
            logs: Vec::new(),
        }
    }

    /// Stay running for `polls` status polls
    pub fn after_polls(mut self, polls: usize) -> Self {
        self.polls_before_end = polls;
        self
    }
}

/// A commit recorded by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommit {
    /// `datasets/ns/name` or `spaces/ns/name`
    pub repo: String,
    /// Paths written
    pub paths: Vec<String>,
    /// Commit summary
    pub summary: String,
}

#[derive(Debug, Clone)]
struct FakeJob {
    job: RemoteJob,
    outcome: JobOutcome,
    polls: usize,
    dataset: Option<RepoId>,
}

/// In-memory hub implementing [`HostingPort`] and [`JobPort`]
pub struct FakeHub {
    account: String,
    repos: Arc<RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>>,
    variables: Arc<RwLock<HashMap<String, BTreeMap<String, String>>>>,
    commits: Arc<RwLock<Vec<RecordedCommit>>>,
    calls: Arc<RwLock<Vec<String>>>,
    failures: Arc<RwLock<HashMap<String, RemoteError>>>,
    jobs: Arc<RwLock<BTreeMap<String, FakeJob>>>,
    submissions: Arc<RwLock<Vec<JobSubmission>>>,
    outcome: Arc<RwLock<JobOutcome>>,
}

fn repo_key(kind: RepoKind, repo: &RepoId) -> String {
    format!("{}{}", kind.url_prefix(), repo)
}

fn not_found(what: impl Into<String>) -> RemoteError {
    RemoteError::with_status(404, format!("{} not found", what.into()))
}

impl FakeHub {
    /// Hub where the token belongs to `account`; the viewer template exists
    pub fn new(account: impl Into<String>) -> Self {
        let hub = Self {
            account: account.into(),
            repos: Arc::new(RwLock::new(HashMap::new())),
            variables: Arc::new(RwLock::new(HashMap::new())),
            commits: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            jobs: Arc::new(RwLock::new(BTreeMap::new())),
            submissions: Arc::new(RwLock::new(Vec::new())),
            outcome: Arc::new(RwLock::new(JobOutcome::succeeded(Vec::new()))),
        };
        hub.repos.write().insert(
            format!("spaces/{}", DEFAULT_VIEWER_TEMPLATE),
            BTreeMap::from([("Dockerfile".to_string(), b"FROM python:3.12".to_vec())]),
        );
        hub
    }

    /// Seed a repository with files
    pub fn with_repo(self, kind: RepoKind, repo: &RepoId, files: &[(&str, &[u8])]) -> Self {
        self.repos.write().insert(
            repo_key(kind, repo),
            files
                .iter()
                .map(|(path, content)| (path.to_string(), content.to_vec()))
                .collect(),
        );
        self
    }

    /// Behavior of jobs submitted from now on
    pub fn set_job_outcome(&self, outcome: JobOutcome) {
        *self.outcome.write() = outcome;
    }

    /// Make every call of `operation` fail with `error`
    pub fn fail_on(&self, operation: &str, error: RemoteError) {
        self.failures.write().insert(operation.to_string(), error);
    }

    /// Stop failing `operation`
    pub fn heal(&self, operation: &str) {
        self.failures.write().remove(operation);
    }

    /// Operation names in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().clone()
    }

    /// Number of remote calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.read().len()
    }

    /// Number of calls of one operation
    pub fn calls_of(&self, operation: &str) -> usize {
        self.calls.read().iter().filter(|c| *c == operation).count()
    }

    /// Commits in order
    pub fn commits(&self) -> Vec<RecordedCommit> {
        self.commits.read().clone()
    }

    /// Submitted jobs in order
    pub fn submissions(&self) -> Vec<JobSubmission> {
        self.submissions.read().clone()
    }

    /// Whether a repository exists
    pub fn has_repo(&self, kind: RepoKind, repo: &RepoId) -> bool {
        self.repos.read().contains_key(&repo_key(kind, repo))
    }

    /// Content of a file
    pub fn file(&self, kind: RepoKind, repo: &RepoId, path: &str) -> Option<Vec<u8>> {
        self.repos
            .read()
            .get(&repo_key(kind, repo))
            .and_then(|files| files.get(path).cloned())
    }

    /// Content of a file as text
    pub fn file_text(&self, kind: RepoKind, repo: &RepoId, path: &str) -> Option<String> {
        self.file(kind, repo, path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Paths of a repository
    pub fn paths(&self, kind: RepoKind, repo: &RepoId) -> Vec<String> {
        self.repos
            .read()
            .get(&repo_key(kind, repo))
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Value of a Space variable
    pub fn variable(&self, space: &RepoId, key: &str) -> Option<String> {
        self.variables
            .read()
            .get(&space.to_string())
            .and_then(|vars| vars.get(key).cloned())
    }

    fn record(&self, operation: &str) -> RemoteResult<()> {
        self.calls.write().push(operation.to_string());
        match self.failures.read().get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn snapshot(&self, namespace: &str, job_id: &str) -> RemoteResult<FakeJob> {
        self.jobs
            .read()
            .get(job_id)
            .filter(|j| j.job.namespace == namespace)
            .cloned()
            .ok_or_else(|| not_found(format!("job {}", job_id)))
    }

    fn write_logs(&self, dataset: &RepoId, logs: &[(String, Vec<u8>)]) {
        if let Some(files) = self.repos.write().get_mut(&repo_key(RepoKind::Dataset, dataset)) {
            for (path, content) in logs {
                files.insert(path.clone(), content.clone());
            }
        }
    }
}

impl Default for FakeHub {
    fn default() -> Self {
        Self::new("tester")
    }
}

#[async_trait]
impl HostingPort for FakeHub {
    fn endpoint(&self) -> String {
        FAKE_ENDPOINT.to_string()
    }

    async fn whoami(&self) -> RemoteResult<String> {
        self.record("whoami")?;
        Ok(self.account.clone())
    }

    async fn repo_exists(&self, kind: RepoKind, repo: &RepoId) -> RemoteResult<bool> {
        self.record("repo_exists")?;
        Ok(self.has_repo(kind, repo))
    }

    async fn create_repo(&self, kind: RepoKind, repo: &RepoId) -> RemoteResult<bool> {
        self.record("create_repo")?;
        let mut repos = self.repos.write();
        let key = repo_key(kind, repo);
        if repos.contains_key(&key) {
            return Ok(false);
        }
        repos.insert(key, BTreeMap::new());
        Ok(true)
    }

    async fn duplicate_space(&self, from: &RepoId, to: &RepoId) -> RemoteResult<()> {
        self.record("duplicate_space")?;
        let mut repos = self.repos.write();
        let files = repos
            .get(&repo_key(RepoKind::Space, from))
            .cloned()
            .ok_or_else(|| not_found(format!("spaces/{}", from)))?;
        let target = repo_key(RepoKind::Space, to);
        if repos.contains_key(&target) {
            return Err(RemoteError::with_status(409, format!("{} already exists", target)));
        }
        repos.insert(target, files);
        Ok(())
    }

    async fn set_space_variable(&self, space: &RepoId, key: &str, value: &str) -> RemoteResult<()> {
        self.record("set_space_variable")?;
        if !self.has_repo(RepoKind::Space, space) {
            return Err(not_found(format!("spaces/{}", space)));
        }
        self.variables
            .write()
            .entry(space.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn commit(
        &self,
        kind: RepoKind,
        repo: &RepoId,
        files: &[BundleFile],
        summary: &str,
    ) -> RemoteResult<()> {
        self.record("commit")?;
        let key = repo_key(kind, repo);
        let mut repos = self.repos.write();
        let stored = repos.get_mut(&key).ok_or_else(|| not_found(key.clone()))?;
        for file in files {
            stored.insert(file.path.clone(), file.content.clone());
        }
        self.commits.write().push(RecordedCommit {
            repo: key,
            paths: files.iter().map(|f| f.path.clone()).collect(),
            summary: summary.to_string(),
        });
        Ok(())
    }

    async fn list_files(&self, kind: RepoKind, repo: &RepoId, prefix: &str) -> RemoteResult<Vec<String>> {
        self.record("list_files")?;
        let prefix = prefix.trim_matches('/');
        Ok(self
            .paths(kind, repo)
            .into_iter()
            .filter(|p| prefix.is_empty() || p.starts_with(&format!("{}/", prefix)))
            .collect())
    }

    async fn download(&self, kind: RepoKind, repo: &RepoId, path: &str) -> RemoteResult<Vec<u8>> {
        self.record("download")?;
        self.file(kind, repo, path)
            .ok_or_else(|| not_found(format!("{}/{}", repo_key(kind, repo), path)))
    }
}

#[async_trait]
impl JobPort for FakeHub {
    async fn submit(&self, submission: &JobSubmission) -> RemoteResult<RemoteJob> {
        self.record("submit")?;
        self.submissions.write().push(submission.clone());

        let mut jobs = self.jobs.write();
        let id = format!("job-{}", jobs.len() + 1);
        let mut command = vec!["uv".to_string(), "run".to_string(), submission.script_url.clone()];
        command.extend(submission.script_args.iter().cloned());

        let job = RemoteJob {
            url: format!("{}/jobs/{}/{}", FAKE_ENDPOINT, submission.namespace, id),
            id: id.clone(),
            namespace: submission.namespace.clone(),
            stage: JobStage::Pending,
            message: None,
            command,
        };
        let dataset = submission
            .script_args
            .get(2)
            .and_then(|d| d.strip_prefix("datasets/"))
            .and_then(|d| d.parse::<RepoId>().ok());

        jobs.insert(
            id,
            FakeJob {
                job: job.clone(),
                outcome: self.outcome.read().clone(),
                polls: 0,
                dataset,
            },
        );
        Ok(job)
    }

    async fn status(&self, namespace: &str, job_id: &str) -> RemoteResult<RemoteJob> {
        self.record("status")?;
        let current = self.snapshot(namespace, job_id)?;
        if current.job.stage.is_terminal() {
            return Ok(current.job);
        }

        let polls = current.polls + 1;
        let ending = match current.outcome.final_stage.clone() {
            Some(stage) if polls > current.outcome.polls_before_end => Some(stage),
            _ => None,
        };

        let mut job = current.job.clone();
        match ending {
            Some(stage) => {
                job.stage = stage;
                job.message = current.outcome.message.clone();
                if let Some(dataset) = &current.dataset {
                    self.write_logs(dataset, &current.outcome.logs);
                }
            }
            None => job.stage = JobStage::Running,
        }

        if let Some(entry) = self.jobs.write().get_mut(job_id) {
            entry.polls = polls;
            entry.job = job.clone();
        }
        Ok(job)
    }

    async fn logs(&self, namespace: &str, job_id: &str) -> RemoteResult<Vec<String>> {
        self.record("logs")?;
        Ok(self.snapshot(namespace, job_id)?.outcome.console)
    }
}
