//! Artifact Publisher
//!
//! Prepares the hosting location (dataset + viewer Space) and uploads the
//! eval script and the runner stub the job executes.

use crate::cards::RepoCards;
use crate::ports::{HostingPort, RemoteError};
use evaljobs_domain::{
    resolve_url, BundleFile, EvalJobsError, EvalJobsResult, EvalSource, HostingLocation, RepoId,
    RepoKind,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Runner stub uploaded next to every eval
pub const RUNNER_SCRIPT: &str = include_str!("../../assets/runner.py");

/// Space duplicated when the viewer Space does not exist yet
pub const DEFAULT_VIEWER_TEMPLATE: &str = "dvilasuero/evaljobs_docker_template";

/// Space variable the viewer reads its log directory from
pub const LOG_DIR_VARIABLE: &str = "LOG_DIR";

const LOGS_PLACEHOLDER: &str = "# This file ensures the logs directory exists\n";

/// Publisher settings
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// `namespace/name` of the viewer template Space
    pub viewer_template: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            viewer_template: DEFAULT_VIEWER_TEMPLATE.to_string(),
        }
    }
}

/// What the job needs to find the eval and the runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifacts {
    /// URL of the eval script, or the package id
    pub eval_ref: String,
    /// URL of the uploaded runner stub
    pub runner_url: String,
    /// Whether `eval_ref` is a package id rather than a script URL
    pub package: bool,
}

/// Artifact publisher service
pub struct ArtifactPublisher<H: HostingPort> {
    hosting: Arc<H>,
    config: PublisherConfig,
}

impl<H: HostingPort> ArtifactPublisher<H> {
    /// Create a publisher
    pub fn new(hosting: Arc<H>, config: PublisherConfig) -> Self {
        Self { hosting, config }
    }

    /// Make sure the dataset and the viewer Space exist and carry fresh cards.
    ///
    /// Existing repositories are reused; nothing is deleted.
    #[instrument(skip(self, cards), fields(location = %location))]
    pub async fn prepare(&self, location: &HostingLocation, cards: &RepoCards) -> EvalJobsResult<()> {
        self.ensure_dataset(location, cards).await?;
        self.ensure_space(location, cards).await
    }

    /// Upload the eval script (local sources only) and the runner stub.
    #[instrument(skip(self), fields(source = %source, location = %location))]
    pub async fn publish(
        &self,
        source: &EvalSource,
        location: &HostingLocation,
    ) -> EvalJobsResult<PublishedArtifacts> {
        let endpoint = self.hosting.endpoint();
        let space = location.id();
        let mut files = Vec::with_capacity(2);

        let (eval_ref, package) = match source {
            EvalSource::Local { path, .. } => {
                let content = tokio::fs::read(path)
                    .await
                    .map_err(|e| EvalJobsError::publish(path.display().to_string(), e.to_string()))?;
                files.push(BundleFile::new("eval.py", content));
                (resolve_url(&endpoint, RepoKind::Space, space, "eval.py"), false)
            }
            EvalSource::Package { id } => (id.clone(), true),
            EvalSource::Hosted { space: origin } => (self.hosted_eval_url(origin).await?, false),
        };
        files.push(BundleFile::new("runner.py", RUNNER_SCRIPT));

        let summary = if files.len() > 1 {
            "Upload eval script and runner"
        } else {
            "Upload runner"
        };
        self.hosting
            .commit(RepoKind::Space, space, &files, summary)
            .await
            .map_err(|e| publish_error(RepoKind::Space, space, e))?;

        info!("Uploaded {} file(s) to spaces/{}", files.len(), space);

        Ok(PublishedArtifacts {
            eval_ref,
            runner_url: resolve_url(&endpoint, RepoKind::Space, space, "runner.py"),
            package,
        })
    }

    async fn ensure_dataset(&self, location: &HostingLocation, cards: &RepoCards) -> EvalJobsResult<()> {
        let repo = location.id();
        let exists = self
            .hosting
            .repo_exists(RepoKind::Dataset, repo)
            .await
            .map_err(|e| publish_error(RepoKind::Dataset, repo, e))?;

        if !exists {
            let created = self
                .hosting
                .create_repo(RepoKind::Dataset, repo)
                .await
                .map_err(|e| publish_error(RepoKind::Dataset, repo, e))?;
            if created {
                info!("Created dataset {}", repo);
            }
        }

        let files = [
            BundleFile::new("logs/.gitkeep", LOGS_PLACEHOLDER),
            BundleFile::new("README.md", cards.dataset.clone()),
        ];
        self.hosting
            .commit(RepoKind::Dataset, repo, &files, "Update evaljobs dataset card")
            .await
            .map_err(|e| publish_error(RepoKind::Dataset, repo, e))
    }

    async fn ensure_space(&self, location: &HostingLocation, cards: &RepoCards) -> EvalJobsResult<()> {
        let repo = location.id();
        let exists = self
            .hosting
            .repo_exists(RepoKind::Space, repo)
            .await
            .map_err(|e| publish_error(RepoKind::Space, repo, e))?;

        if !exists {
            let template: RepoId = self.config.viewer_template.parse()?;
            debug!("Duplicating {} into {}", template, repo);
            self.hosting
                .duplicate_space(&template, repo)
                .await
                .map_err(|e| publish_error(RepoKind::Space, repo, e))?;
            info!("Created Space {}", repo);
        }

        self.hosting
            .set_space_variable(repo, LOG_DIR_VARIABLE, &location.log_dir())
            .await
            .map_err(|e| publish_error(RepoKind::Space, repo, e))?;

        let card = [BundleFile::new("README.md", cards.space.clone())];
        self.hosting
            .commit(RepoKind::Space, repo, &card, "Update evaljobs Space card")
            .await
            .map_err(|e| publish_error(RepoKind::Space, repo, e))
    }

    /// Resolve URL of the first root-level `eval*.py` of a Space
    async fn hosted_eval_url(&self, origin: &RepoId) -> EvalJobsResult<String> {
        let mut files = self
            .hosting
            .list_files(RepoKind::Space, origin, "")
            .await
            .map_err(|e| publish_error(RepoKind::Space, origin, e))?;
        files.sort();

        let script = files
            .iter()
            .find(|f| !f.contains('/') && f.starts_with("eval") && f.ends_with(".py"))
            .ok_or_else(|| {
                EvalJobsError::invalid_reference(
                    format!("spaces/{}", origin),
                    "no eval*.py script found in the Space",
                )
            })?;

        Ok(resolve_url(&self.hosting.endpoint(), RepoKind::Space, origin, script))
    }
}

fn publish_error(kind: RepoKind, repo: &RepoId, err: RemoteError) -> EvalJobsError {
    EvalJobsError::publish(format!("{}{}", kind.url_prefix(), repo), err.message)
}
