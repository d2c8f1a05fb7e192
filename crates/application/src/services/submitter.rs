//! Job Submitter

use crate::ports::{JobPort, JobSubmission, RemoteJob};
use crate::services::publisher::PublishedArtifacts;
use evaljobs_domain::{EvalJobsError, EvalJobsResult, JobRequest, ModelList};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Secret name the runner reads the token from
pub const TOKEN_SECRET: &str = "HF_TOKEN";

/// A job accepted by the job service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    /// Remote job as returned on submission
    pub job: RemoteJob,
    /// Models this job evaluates
    pub models: ModelList,
}

/// Job submitter service
pub struct JobSubmitter<J: JobPort> {
    jobs: Arc<J>,
}

impl<J: JobPort> JobSubmitter<J> {
    /// Create a submitter
    pub fn new(jobs: Arc<J>) -> Self {
        Self { jobs }
    }

    /// Submit every job of the request, one after another.
    ///
    /// If a later submission is rejected, the jobs already accepted keep
    /// running; their ids are listed in the error.
    #[instrument(skip(self, request, artifacts, token), fields(location = %request.location))]
    pub async fn submit(
        &self,
        request: &JobRequest,
        artifacts: &PublishedArtifacts,
        token: &str,
    ) -> EvalJobsResult<Vec<SubmittedJob>> {
        let mut submitted = Vec::new();

        for (models, submission) in build_submissions(request, artifacts, token) {
            match self.jobs.submit(&submission).await {
                Ok(job) => {
                    info!("Submitted job {} for {}", job.id, models);
                    submitted.push(SubmittedJob { job, models });
                }
                Err(e) if submitted.is_empty() => {
                    return Err(EvalJobsError::SubmissionError(e.message));
                }
                Err(e) => {
                    let ids: Vec<&str> = submitted.iter().map(|s| s.job.id.as_str()).collect();
                    return Err(EvalJobsError::SubmissionError(format!(
                        "{} (already submitted: {})",
                        e.message,
                        ids.join(", ")
                    )));
                }
            }
        }

        Ok(submitted)
    }
}

/// Submissions for a request, one per model batch
pub fn build_submissions(
    request: &JobRequest,
    artifacts: &PublishedArtifacts,
    token: &str,
) -> Vec<(ModelList, JobSubmission)> {
    request
        .job_batches()
        .into_iter()
        .map(|models| {
            let mut script_args = vec![
                artifacts.eval_ref.clone(),
                models.as_arg(),
                request.location.dataset_path(),
            ];
            if artifacts.package {
                script_args.push("--package".to_string());
            }
            if let Some(limit) = request.limit {
                script_args.push("--limit".to_string());
                script_args.push(limit.to_string());
            }
            script_args.extend(request.extra_args.iter().cloned());

            let submission = JobSubmission {
                namespace: request.location.id().namespace().to_string(),
                script_url: artifacts.runner_url.clone(),
                script_args,
                flavor: request.flavor,
                timeout_secs: request.timeout.as_secs(),
                secrets: BTreeMap::from([(TOKEN_SECRET.to_string(), token.to_string())]),
            };
            (models, submission)
        })
        .collect()
}
