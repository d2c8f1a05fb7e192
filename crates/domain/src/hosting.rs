//! Hub repository identifiers and the hosting location of a run.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::EvalJobsError;

static SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,95}$").expect("valid segment regex"));

/// Check a single `namespace` or `name` segment
pub fn is_valid_segment(segment: &str) -> bool {
    SEGMENT.is_match(segment) && !segment.contains("..") && !segment.ends_with('.')
}

/// Kind of hub repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    /// Model repository
    Model,
    /// Dataset repository
    Dataset,
    /// Space (hosted app)
    Space,
}

impl RepoKind {
    /// Plural path segment used by the REST API (`/api/datasets/...`)
    pub fn api_segment(&self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Dataset => "datasets",
            Self::Space => "spaces",
        }
    }

    /// Prefix used in web and `resolve` URLs; models have none
    pub fn url_prefix(&self) -> &'static str {
        match self {
            Self::Model => "",
            Self::Dataset => "datasets/",
            Self::Space => "spaces/",
        }
    }
}

impl Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Dataset => write!(f, "dataset"),
            Self::Space => write!(f, "space"),
        }
    }
}

/// `namespace/name` identifier of a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    namespace: String,
    name: String,
}

impl RepoId {
    /// Build an identifier, validating both segments
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, EvalJobsError> {
        let namespace = namespace.into();
        let name = name.into();
        if !is_valid_segment(&namespace) || !is_valid_segment(&name) {
            return Err(EvalJobsError::InvalidRequest(format!(
                "'{}/{}' is not a valid repository id",
                namespace, name
            )));
        }
        Ok(Self { namespace, name })
    }

    /// Owner segment
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Repository name segment
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for RepoId {
    type Err = EvalJobsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name)) if !name.contains('/') => Self::new(namespace, name),
            _ => Err(EvalJobsError::InvalidRequest(format!(
                "'{}' is not of the form namespace/name",
                s
            ))),
        }
    }
}

/// Where a run publishes: a dataset for logs and exports, and a Space for the
/// eval script, the runner stub and the live log viewer. Both share one id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingLocation {
    id: RepoId,
}

impl HostingLocation {
    /// Location `namespace/name`
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, EvalJobsError> {
        Ok(Self {
            id: RepoId::new(namespace, name)?,
        })
    }

    /// Shared repository id
    pub fn id(&self) -> &RepoId {
        &self.id
    }

    /// Short name given with `--name`
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// `datasets/namespace/name`, the form the runner stub expects
    pub fn dataset_path(&self) -> String {
        format!("datasets/{}", self.id)
    }

    /// Log directory the evaluation framework writes into
    pub fn log_dir(&self) -> String {
        format!("hf://datasets/{}/logs", self.id)
    }

    /// Browser URL of the dataset
    pub fn dataset_url(&self, endpoint: &str) -> String {
        format!("{}/datasets/{}", endpoint.trim_end_matches('/'), self.id)
    }

    /// Browser URL of the viewer Space
    pub fn space_url(&self, endpoint: &str) -> String {
        format!("{}/spaces/{}", endpoint.trim_end_matches('/'), self.id)
    }
}

impl Display for HostingLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

/// URL of a file through the hub `resolve` endpoint
pub fn resolve_url(endpoint: &str, kind: RepoKind, repo: &RepoId, path: &str) -> String {
    format!(
        "{}/{}{}/resolve/main/{}",
        endpoint.trim_end_matches('/'),
        kind.url_prefix(),
        repo,
        path
    )
}
