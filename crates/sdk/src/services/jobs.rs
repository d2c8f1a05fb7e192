//! Job service
//!
//! Submission, status and console logs of remote jobs.

use std::collections::BTreeMap;

use crate::client::Client;
use crate::error::SdkResult;
use crate::models::{HardwareFlavor, JobInfo, JobLogLine, JobSpec};

/// Image that runs `uv run <script>` jobs
pub const UV_IMAGE: &str = "ghcr.io/astral-sh/uv:python3.12-bookworm";

/// Service for job operations
#[derive(Clone)]
pub struct JobService {
    client: Client,
}

impl JobService {
    /// Create a new job service
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// Submit a job under `namespace`
    pub async fn run(&self, namespace: &str, spec: &JobSpec) -> SdkResult<JobInfo> {
        self.client
            .post(&format!("/api/jobs/{}", namespace), spec)
            .await
    }

    /// Current state of a job
    pub async fn get(&self, namespace: &str, job_id: &str) -> SdkResult<JobInfo> {
        self.client
            .get(&format!("/api/jobs/{}/{}", namespace, job_id))
            .await
    }

    /// Console output of a job.
    ///
    /// The endpoint streams server-sent events; for finished jobs the stream
    /// ends and the whole body is parsed at once.
    pub async fn logs(&self, namespace: &str, job_id: &str) -> SdkResult<Vec<JobLogLine>> {
        let body = self
            .client
            .get_text(&format!("/api/jobs/{}/{}/logs", namespace, job_id))
            .await?;
        Ok(parse_event_stream(&body))
    }
}

/// Spec of a job that runs a script with `uv run`
pub fn uv_job_spec(
    script_url: &str,
    script_args: &[String],
    flavor: HardwareFlavor,
    timeout_seconds: Option<u64>,
    secrets: BTreeMap<String, String>,
) -> JobSpec {
    let mut command = vec!["uv".to_string(), "run".to_string(), script_url.to_string()];
    command.extend(script_args.iter().cloned());

    JobSpec {
        docker_image: UV_IMAGE.to_string(),
        command,
        arguments: Vec::new(),
        environment: BTreeMap::new(),
        secrets,
        flavor,
        timeout_seconds,
    }
}

/// Extract `data:` payloads from an event stream body.
///
/// Payloads are JSON objects carrying `data` and `timestamp`; anything else is
/// kept verbatim as a line of text.
pub fn parse_event_stream(body: &str) -> Vec<JobLogLine> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .filter(|payload| !payload.is_empty())
        .map(|payload| {
            serde_json::from_str::<JobLogLine>(payload).unwrap_or_else(|_| JobLogLine {
                data: payload.to_string(),
                timestamp: None,
            })
        })
        .collect()
}
