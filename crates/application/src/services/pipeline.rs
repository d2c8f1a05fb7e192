//! Eval pipeline
//!
//! One invocation end to end: resolve, prepare, publish, submit, then wait for
//! and collect every job.

use super::{
    ArtifactPublisher, CollectorConfig, EventObserver, JobSubmitter, NoOpObserver, PipelineEvent,
    PublisherConfig, ResultCollector, SubmittedJob, TOKEN_SECRET,
};
use crate::cards::RepoCards;
use crate::ports::{HostingPort, JobPort, RemoteJob};
use evaljobs_domain::hosting::is_valid_segment;
use evaljobs_domain::{
    BundleStatus, EvalJobsError, EvalJobsResult, EvalSource, HardwareFlavor, HostingLocation,
    JobRequest, JobTimeout, ModelList, MultiModelPolicy, ResultBundle, Resolver,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Pipeline settings
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Publisher settings
    pub publisher: PublisherConfig,
    /// Collector settings, export format included
    pub collector: CollectorConfig,
}

/// Raw parameters of one `evaljobs` invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Eval reference as typed
    pub reference: String,
    /// Comma-separated models as typed
    pub models: String,
    /// Hosting location name
    pub name: String,
    /// Namespace override; the token's account when absent
    pub namespace: Option<String>,
    /// Compute tier
    pub flavor: HardwareFlavor,
    /// Remote timeout
    pub timeout: JobTimeout,
    /// Sample cap
    pub limit: Option<u32>,
    /// Pass-through arguments for the evaluation framework
    pub extra_args: Vec<String>,
    /// Multi-model policy
    pub policy: MultiModelPolicy,
    /// Return right after submission
    pub detach: bool,
}

impl Invocation {
    /// Invocation with default flavor, timeout and policy
    pub fn new(reference: impl Into<String>, models: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            models: models.into(),
            name: name.into(),
            namespace: None,
            flavor: HardwareFlavor::default(),
            timeout: JobTimeout::default(),
            limit: None,
            extra_args: Vec::new(),
            policy: MultiModelPolicy::default(),
            detach: false,
        }
    }
}

/// Outcome of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    /// Remote job id
    pub job_id: String,
    /// Browser URL
    pub url: String,
    /// Models the job evaluates
    pub models: String,
    /// Last stage seen
    pub stage: String,
    /// Bundle status; `None` when results were not collected
    pub status: Option<BundleStatus>,
    /// Failure message, if the job or its collection failed
    pub error: Option<String>,
}

impl JobReport {
    fn submitted(submitted: &SubmittedJob) -> Self {
        Self {
            job_id: submitted.job.id.clone(),
            url: submitted.job.url.clone(),
            models: submitted.models.as_arg(),
            stage: submitted.job.stage.to_string(),
            status: None,
            error: None,
        }
    }
}

/// Summary of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Resolved eval source
    pub source: EvalSource,
    /// Target hosting location
    pub location: HostingLocation,
    /// Viewer Space URL
    pub space_url: String,
    /// Results dataset URL
    pub dataset_url: String,
    /// Jobs in submission order
    pub jobs: Vec<JobReport>,
}

/// The evaljobs pipeline
pub struct EvalPipeline<H: HostingPort, J: JobPort> {
    hosting: Arc<H>,
    jobs: Arc<J>,
    resolver: Resolver,
    publisher: ArtifactPublisher<H>,
    submitter: JobSubmitter<J>,
    collector: ResultCollector<H, J>,
    config: PipelineConfig,
    observer: Arc<dyn EventObserver>,
}

impl<H: HostingPort, J: JobPort> EvalPipeline<H, J> {
    /// Create a pipeline
    pub fn new(hosting: Arc<H>, jobs: Arc<J>, resolver: Resolver, config: PipelineConfig) -> Self {
        Self {
            publisher: ArtifactPublisher::new(Arc::clone(&hosting), config.publisher.clone()),
            submitter: JobSubmitter::new(Arc::clone(&jobs)),
            collector: ResultCollector::new(Arc::clone(&hosting), Arc::clone(&jobs), config.collector.clone()),
            hosting,
            jobs,
            resolver,
            config,
            observer: Arc::new(NoOpObserver),
        }
    }

    /// Report progress to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run one invocation.
    ///
    /// Every local check (token, models, reference, name) happens before the
    /// first remote call. Once jobs are submitted, all of them are collected
    /// before the first failure, if any, is returned.
    #[instrument(skip(self, invocation, token), fields(reference = %invocation.reference, name = %invocation.name))]
    pub async fn run(&self, invocation: &Invocation, token: Option<&str>) -> EvalJobsResult<RunReport> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EvalJobsError::MissingCredentials(TOKEN_SECRET.to_string()))?;
        let models = ModelList::parse(&invocation.models)?;
        let source = self.resolver.resolve(&invocation.reference)?;
        check_name(&invocation.name)?;
        self.observer.on_event(&PipelineEvent::Resolved {
            source: source.clone(),
        });

        let namespace = self.namespace(invocation.namespace.as_deref()).await?;
        let location = HostingLocation::new(namespace, invocation.name.as_str())?;
        let request = JobRequest::new(source, models, location)
            .with_flavor(invocation.flavor)
            .with_timeout(invocation.timeout.clone())
            .with_limit(invocation.limit)
            .with_extra_args(invocation.extra_args.clone())
            .with_policy(invocation.policy);
        request.validate()?;

        let endpoint = self.hosting.endpoint();
        let cards = RepoCards::render(
            &invocation.reference,
            &request,
            &endpoint,
            self.config.collector.export,
        );
        self.publisher.prepare(&request.location, &cards).await?;
        self.observer.on_event(&PipelineEvent::LocationReady {
            location: request.location.clone(),
        });

        let artifacts = self.publisher.publish(&request.source, &request.location).await?;
        self.observer.on_event(&PipelineEvent::ArtifactsPublished {
            eval_ref: artifacts.eval_ref.clone(),
            runner_url: artifacts.runner_url.clone(),
        });

        let submitted = self.submitter.submit(&request, &artifacts, token).await?;
        for job in &submitted {
            self.observer.on_event(&PipelineEvent::JobSubmitted {
                job: job.job.clone(),
                models: job.models.as_arg(),
            });
        }

        let mut report = RunReport {
            space_url: request.location.space_url(&endpoint),
            dataset_url: request.location.dataset_url(&endpoint),
            source: request.source.clone(),
            location: request.location.clone(),
            jobs: submitted.iter().map(JobReport::submitted).collect(),
        };

        if invocation.detach {
            info!("Detached after submitting {} job(s)", submitted.len());
            return Ok(report);
        }

        let deadline = self.collector.deadline_for(request.timeout.duration());
        let mut first_failure = None;
        for (entry, job) in report.jobs.iter_mut().zip(&submitted) {
            if let Err(e) = self
                .finish(&job.job, &job.models.as_arg(), &request.location, deadline, entry)
                .await
            {
                entry.error = Some(e.to_string());
                first_failure.get_or_insert(e);
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Collect a job submitted earlier, waiting up to `wait` for it to finish.
    #[instrument(skip(self))]
    pub async fn collect_job(
        &self,
        job_id: &str,
        name: &str,
        namespace: Option<&str>,
        wait: Duration,
    ) -> EvalJobsResult<(RemoteJob, ResultBundle)> {
        check_name(name)?;
        let namespace = self.namespace(namespace).await?;
        let location = HostingLocation::new(namespace.as_str(), name)?;

        let job = self
            .jobs
            .status(&namespace, job_id)
            .await
            .map_err(|e| EvalJobsError::collection(job_id, e.message))?;
        let models = job.models_arg().unwrap_or_default().to_string();

        let mut entry = JobReport {
            job_id: job.id.clone(),
            url: job.url.clone(),
            models: models.clone(),
            stage: job.stage.to_string(),
            status: None,
            error: None,
        };
        self.finish(&job, &models, &location, wait, &mut entry).await
    }

    async fn finish(
        &self,
        job: &RemoteJob,
        models: &str,
        location: &HostingLocation,
        deadline: Duration,
        entry: &mut JobReport,
    ) -> EvalJobsResult<(RemoteJob, ResultBundle)> {
        self.observer.on_event(&PipelineEvent::Waiting {
            job_id: job.id.clone(),
            deadline,
        });
        let finished = if job.stage.is_terminal() {
            job.clone()
        } else {
            self.collector.await_completion(job, deadline).await?
        };
        entry.stage = finished.stage.to_string();
        self.observer.on_event(&PipelineEvent::JobFinished {
            job: finished.clone(),
        });

        match self.collector.collect(&finished, models, location).await {
            Ok(bundle) => {
                entry.status = Some(bundle.manifest.status);
                self.observer.on_event(&PipelineEvent::ResultsPublished {
                    job_id: finished.id.clone(),
                    status: bundle.manifest.status,
                    artifacts: bundle.log_artifact_count(),
                });
                Ok((finished, bundle))
            }
            Err(EvalJobsError::RemoteJobFailure {
                job_id,
                stage,
                message,
                published,
            }) => {
                entry.status = Some(BundleStatus::Incomplete);
                self.observer.on_event(&PipelineEvent::ResultsPublished {
                    job_id: job_id.clone(),
                    status: BundleStatus::Incomplete,
                    artifacts: published,
                });
                Err(EvalJobsError::RemoteJobFailure {
                    job_id,
                    stage,
                    message,
                    published,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn namespace(&self, explicit: Option<&str>) -> EvalJobsResult<String> {
        match explicit {
            Some(ns) => Ok(ns.to_string()),
            None => self
                .hosting
                .whoami()
                .await
                .map_err(|e| EvalJobsError::publish("whoami", e.message)),
        }
    }
}

fn check_name(name: &str) -> EvalJobsResult<()> {
    if is_valid_segment(name) {
        Ok(())
    } else {
        Err(EvalJobsError::InvalidRequest(format!(
            "--name '{}' must use letters, digits, '-', '_' or '.'",
            name
        )))
    }
}
