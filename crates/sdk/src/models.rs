//! SDK data models
//!
//! This module provides the data structures used in API requests and responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Re-export domain types for convenience
pub use evaljobs_domain::{HardwareFlavor, JobStage, RepoId, RepoKind};

// ============================================================================
// Account Models
// ============================================================================

/// Answer of `GET /api/whoami-v2`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmI {
    /// Account name, used as default namespace
    pub name: String,
    /// `user` or `org`
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
    /// Organizations the account belongs to
    #[serde(default)]
    pub orgs: Vec<Organization>,
}

/// Organization membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Organization name
    pub name: String,
}

// ============================================================================
// Repository Models
// ============================================================================

/// Repository metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoInfo {
    /// `namespace/name`
    pub id: String,
    /// Visibility
    #[serde(default)]
    pub private: bool,
    /// Head commit
    #[serde(default)]
    pub sha: Option<String>,
    /// Last modification timestamp
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// Body of `POST /api/repos/create`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRepoRequest {
    /// Repository kind
    #[serde(rename = "type")]
    pub kind: RepoKind,
    /// Repository name
    pub name: String,
    /// Owner namespace
    pub organization: String,
    /// Visibility
    pub private: bool,
    /// Space SDK, only for Spaces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,
}

/// Entry of `GET /api/{kind}/{id}/tree/{rev}/{path}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFile {
    /// `file` or `directory`
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Path relative to the repository root
    pub path: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    /// Git object id
    #[serde(default)]
    pub oid: Option<String>,
}

impl RepoFile {
    /// Whether the entry is a regular file
    pub fn is_file(&self) -> bool {
        self.entry_type == "file"
    }
}

/// A file added or replaced by a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFile {
    /// Path inside the repository
    pub path: String,
    /// Raw content
    pub content: Vec<u8>,
}

impl CommitFile {
    /// Create a commit file
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Answer of a commit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    /// Browser URL of the commit
    #[serde(default)]
    pub commit_url: Option<String>,
    /// Commit id
    #[serde(default)]
    pub commit_oid: Option<String>,
}

// ============================================================================
// Space Models
// ============================================================================

/// Body of `POST /api/spaces/{from}/duplicate`
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateSpaceRequest {
    /// Target `namespace/name`
    pub repository: String,
    /// Visibility of the copy
    pub private: bool,
}

/// Space environment variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceVariable {
    /// Variable name
    pub key: String,
    /// Variable value
    pub value: String,
}

// ============================================================================
// Job Models
// ============================================================================

/// Body of `POST /api/jobs/{namespace}`
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// Container image
    pub docker_image: String,
    /// Entrypoint and its arguments
    pub command: Vec<String>,
    /// Extra arguments appended by the service
    pub arguments: Vec<String>,
    /// Plain environment variables
    pub environment: BTreeMap<String, String>,
    /// Encrypted environment variables
    pub secrets: BTreeMap<String, String>,
    /// Compute tier
    pub flavor: HardwareFlavor,
    /// Remote timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl std::fmt::Debug for JobSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSpec")
            .field("docker_image", &self.docker_image)
            .field("command", &self.command)
            .field("arguments", &self.arguments)
            .field("environment", &self.environment)
            .field("secrets", &self.secrets.keys().collect::<Vec<_>>())
            .field("flavor", &self.flavor)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Status block of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Lifecycle stage
    pub stage: JobStage,
    /// Failure or progress message
    #[serde(default)]
    pub message: Option<String>,
}

/// Owner block of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOwner {
    /// Owner namespace
    pub name: String,
}

/// Job as returned by the job service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    /// Job identifier
    pub id: String,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    /// Container image
    #[serde(default)]
    pub docker_image: Option<String>,
    /// Entrypoint and its arguments
    #[serde(default)]
    pub command: Vec<String>,
    /// Compute tier, kept as a string so newer tiers still parse
    #[serde(default)]
    pub flavor: Option<String>,
    /// Current status
    pub status: JobStatus,
    /// Owner
    pub owner: JobOwner,
}

impl JobInfo {
    /// Browser URL of the job
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/jobs/{}/{}",
            endpoint.trim_end_matches('/'),
            self.owner.name,
            self.id
        )
    }
}

/// One line of job console output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogLine {
    /// Text of the line
    pub data: String,
    /// Emission timestamp
    #[serde(default)]
    pub timestamp: Option<String>,
}
