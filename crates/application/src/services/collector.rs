//! Result Collector
//!
//! Waits for a job to reach a terminal stage, then publishes its console log,
//! the tabular export and a status manifest to the results dataset. Partial
//! results of failed jobs are published too, marked `incomplete`.

use crate::export::ResultTables;
use crate::ports::{HostingPort, JobPort, RemoteJob};
use evaljobs_domain::{
    BundleFile, BundleManifest, BundleStatus, EvalJobsError, EvalJobsResult, ExportFormat,
    HostingLocation, JobStage, RepoKind, ResultBundle,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default delay between two status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default extra wait on top of the job timeout
pub const DEFAULT_WAIT_GRACE: Duration = Duration::from_secs(300);

/// Folder of the results dataset inspect writes into
pub const LOGS_FOLDER: &str = "logs";

/// Folder of the results dataset holding console logs and manifests
pub const JOBS_FOLDER: &str = "jobs";

const MANIFEST_SUFFIX: &str = ".status.json";

/// Collector settings
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Delay between two status polls
    pub poll_interval: Duration,
    /// Extra wait on top of the job timeout before giving up locally
    pub grace: Duration,
    /// Tabular export format
    pub export: ExportFormat,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            grace: DEFAULT_WAIT_GRACE,
            export: ExportFormat::default(),
        }
    }
}

/// Result collector service
pub struct ResultCollector<H: HostingPort, J: JobPort> {
    hosting: Arc<H>,
    jobs: Arc<J>,
    config: CollectorConfig,
}

impl<H: HostingPort, J: JobPort> ResultCollector<H, J> {
    /// Create a collector
    pub fn new(hosting: Arc<H>, jobs: Arc<J>, config: CollectorConfig) -> Self {
        Self {
            hosting,
            jobs,
            config,
        }
    }

    /// Local deadline for a job with the given remote timeout
    pub fn deadline_for(&self, job_timeout: Duration) -> Duration {
        job_timeout + self.config.grace
    }

    /// Poll until the job reaches a terminal stage or `deadline` elapses.
    ///
    /// An elapsed deadline is not an error here: the returned snapshot has
    /// stage [`JobStage::TimedOut`] and is collected like any failed job.
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    pub async fn await_completion(&self, job: &RemoteJob, deadline: Duration) -> EvalJobsResult<RemoteJob> {
        match tokio::time::timeout(deadline, self.poll_until_terminal(job)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Job {} did not finish within {:?}", job.id, deadline);
                Ok(RemoteJob {
                    stage: JobStage::TimedOut,
                    message: Some(format!(
                        "no terminal stage reported within {}s",
                        deadline.as_secs()
                    )),
                    ..job.clone()
                })
            }
        }
    }

    async fn poll_until_terminal(&self, job: &RemoteJob) -> EvalJobsResult<RemoteJob> {
        loop {
            let current = self
                .jobs
                .status(&job.namespace, &job.id)
                .await
                .map_err(|e| EvalJobsError::collection(&job.id, e.message))?;
            if current.stage.is_terminal() {
                return Ok(current);
            }
            debug!("Job {} is {}", job.id, current.stage);
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Gather and publish the results of a finished job.
    ///
    /// Returns the published bundle on success. A job that did not complete
    /// still gets its bundle published, then yields
    /// [`EvalJobsError::RemoteJobFailure`].
    #[instrument(skip(self, job, models), fields(job_id = %job.id, location = %location))]
    pub async fn collect(
        &self,
        job: &RemoteJob,
        models: &str,
        location: &HostingLocation,
    ) -> EvalJobsResult<ResultBundle> {
        let bundle = self.assemble(job, models, location).await?;

        let summary = format!("Add results of job {} ({})", job.id, bundle.manifest.status);
        self.hosting
            .commit(RepoKind::Dataset, location.id(), &bundle.files, &summary)
            .await
            .map_err(|e| EvalJobsError::collection(&job.id, e.message))?;

        info!(
            "Published {} file(s) for job {} to datasets/{}",
            bundle.files.len(),
            job.id,
            location.id()
        );

        if bundle.is_incomplete() {
            return Err(EvalJobsError::RemoteJobFailure {
                job_id: job.id.clone(),
                stage: job.stage.to_string(),
                message: job.message.clone().unwrap_or_else(|| "no message".to_string()),
                published: bundle.log_artifact_count(),
            });
        }
        Ok(bundle)
    }

    /// Build the bundle without publishing it.
    ///
    /// For a job that did not succeed, a missing console log or log file is
    /// noted in the manifest message instead of aborting the collection.
    pub async fn assemble(
        &self,
        job: &RemoteJob,
        models: &str,
        location: &HostingLocation,
    ) -> EvalJobsResult<ResultBundle> {
        let failed = !job.stage.is_success();
        let mut notes = Vec::new();

        let console = match self.jobs.logs(&job.namespace, &job.id).await {
            Ok(lines) => Some(lines),
            Err(e) if failed => {
                warn!("Console log of job {} unavailable: {}", job.id, e.message);
                notes.push(format!("console log unavailable: {}", e.message));
                None
            }
            Err(e) => return Err(EvalJobsError::collection(&job.id, e.message)),
        };

        let logs = self.download_logs(job, location, failed, &mut notes).await?;
        let tables = ResultTables::from_logs(&logs);
        let exports = tables
            .to_files(self.config.export)
            .map_err(|e| EvalJobsError::collection(&job.id, e.to_string()))?;

        let claimed = self.claimed_logs(job, location).await;
        let job_models: Vec<&str> = models
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect();
        let log_files = logs
            .iter()
            .map(|(path, _)| path)
            .filter(|path| !claimed.contains(*path))
            .filter(|path| match tables.models.get(*path) {
                Some(model) => job_models.is_empty() || job_models.contains(&model.as_str()),
                None => false,
            })
            .cloned()
            .collect();

        let status = if failed {
            BundleStatus::Incomplete
        } else {
            BundleStatus::Complete
        };
        let message = job.message.iter().cloned().chain(notes).collect::<Vec<_>>();

        let manifest = BundleManifest {
            job_id: job.id.clone(),
            job_url: Some(job.url.clone()),
            models: models.to_string(),
            stage: job.stage.to_string(),
            status,
            message: if message.is_empty() {
                None
            } else {
                Some(message.join("; "))
            },
            log_files,
            export_files: exports.iter().map(|f| f.path.clone()).collect(),
            collected_at: chrono::Utc::now(),
        };

        let mut files = Vec::with_capacity(exports.len() + 2);
        if let Some(console) = console {
            let mut console_text = console.join("\n");
            if !console_text.is_empty() {
                console_text.push('\n');
            }
            files.push(BundleFile::new(format!("{}/{}.log", JOBS_FOLDER, job.id), console_text));
        }
        files.extend(exports);
        let manifest_json = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| EvalJobsError::collection(&job.id, e.to_string()))?;
        files.push(BundleFile::new(manifest_path(&job.id), manifest_json));

        Ok(ResultBundle { files, manifest })
    }

    /// `(path, content)` of every inspect JSON log in the dataset.
    ///
    /// When `failed` is set, listing and download failures are recorded in
    /// `notes` and the remaining logs are still returned.
    async fn download_logs(
        &self,
        job: &RemoteJob,
        location: &HostingLocation,
        failed: bool,
        notes: &mut Vec<String>,
    ) -> EvalJobsResult<Vec<(String, Vec<u8>)>> {
        let repo = location.id();
        let mut paths = match self
            .hosting
            .list_files(RepoKind::Dataset, repo, LOGS_FOLDER)
            .await
        {
            Ok(paths) => paths,
            Err(e) if failed => {
                warn!("Cannot list logs of job {}: {}", job.id, e.message);
                notes.push(format!("log listing unavailable: {}", e.message));
                Vec::new()
            }
            Err(e) => return Err(EvalJobsError::collection(&job.id, e.message)),
        };
        paths.retain(|p| p.ends_with(".json"));
        paths.sort();

        let mut logs = Vec::with_capacity(paths.len());
        for path in paths {
            match self.hosting.download(RepoKind::Dataset, repo, &path).await {
                Ok(content) => logs.push((path, content)),
                Err(e) if failed => {
                    warn!("Skipping {} of job {}: {}", path, job.id, e.message);
                    notes.push(format!("{} unavailable: {}", path, e.message));
                }
                Err(e) => {
                    return Err(EvalJobsError::collection(
                        &job.id,
                        format!("{}: {}", path, e.message),
                    ))
                }
            }
        }
        debug!("Downloaded {} log file(s)", logs.len());
        Ok(logs)
    }

    /// Logs already attributed to other jobs by their published manifests
    async fn claimed_logs(&self, job: &RemoteJob, location: &HostingLocation) -> BTreeSet<String> {
        let repo = location.id();
        let own = manifest_path(&job.id);
        let paths = match self.hosting.list_files(RepoKind::Dataset, repo, JOBS_FOLDER).await {
            Ok(paths) => paths,
            Err(e) => {
                debug!("No earlier manifests in datasets/{}: {}", repo, e.message);
                return BTreeSet::new();
            }
        };

        let mut claimed = BTreeSet::new();
        for path in paths.iter().filter(|p| p.ends_with(MANIFEST_SUFFIX) && **p != own) {
            let manifest = match self.hosting.download(RepoKind::Dataset, repo, path).await {
                Ok(content) => serde_json::from_slice::<BundleManifest>(&content),
                Err(e) => {
                    warn!("Cannot read {}: {}", path, e.message);
                    continue;
                }
            };
            match manifest {
                Ok(manifest) => claimed.extend(manifest.log_files),
                Err(e) => warn!("Ignoring malformed manifest {}: {}", path, e),
            }
        }
        claimed
    }
}

fn manifest_path(job_id: &str) -> String {
    format!("{}/{}{}", JOBS_FOLDER, job_id, MANIFEST_SUFFIX)
}
