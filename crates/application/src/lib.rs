//! Application layer for evaljobs
//!
//! This crate orchestrates an invocation on top of two ports: the hosting
//! service (datasets and Spaces) and the job service.
//!
//! ## Modules
//!
//! - `ports` - `HostingPort` and `JobPort`, implemented by the CLI over HTTP
//! - `services` - Artifact Publisher, Job Submitter, Result Collector and the `EvalPipeline`
//! - `export` - inspect logs to `evals` / `samples` tables
//! - `cards` - README cards and command rendering

pub mod cards;
pub mod export;
pub mod ports;
pub mod services;

pub use cards::RepoCards;
pub use export::{ExportError, ExportTable, ResultTables};
pub use ports::{HostingPort, JobPort, JobSubmission, RemoteError, RemoteJob, RemoteResult};
pub use services::{
    ArtifactPublisher, CollectorConfig, EvalPipeline, EventObserver, Invocation, JobReport,
    JobSubmitter, NoOpObserver, PipelineConfig, PipelineEvent, PublishedArtifacts, PublisherConfig,
    ResultCollector, RunReport, SubmittedJob, RUNNER_SCRIPT,
};
