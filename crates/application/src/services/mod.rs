//! Application Services
//!
//! The four stages of an invocation (publish, submit, wait, collect) and the
//! pipeline that chains them.

mod collector;
mod pipeline;
mod publisher;
mod submitter;

pub use collector::*;
pub use pipeline::*;
pub use publisher::*;
pub use submitter::*;

use crate::ports::RemoteJob;
use evaljobs_domain::{BundleStatus, EvalSource, HostingLocation};
use std::time::Duration;

/// Progress of a pipeline run
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The eval reference was classified
    Resolved { source: EvalSource },
    /// Dataset and viewer Space exist and carry fresh cards
    LocationReady { location: HostingLocation },
    /// Eval and runner are reachable by the job
    ArtifactsPublished { eval_ref: String, runner_url: String },
    /// The job service accepted a job
    JobSubmitted { job: RemoteJob, models: String },
    /// Waiting for a job to finish
    Waiting { job_id: String, deadline: Duration },
    /// A job reached a terminal stage (or the deadline)
    JobFinished { job: RemoteJob },
    /// Results of a job were published
    ResultsPublished {
        job_id: String,
        status: BundleStatus,
        artifacts: usize,
    },
}

/// Receives pipeline progress, e.g. to drive a terminal UI
pub trait EventObserver: Send + Sync {
    /// Called synchronously for every event
    fn on_event(&self, event: &PipelineEvent);
}

/// Observer that ignores every event
pub struct NoOpObserver;

impl EventObserver for NoOpObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}
