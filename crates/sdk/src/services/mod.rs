//! SDK services
//!
//! This module contains service implementations for the API resources.

mod jobs;
mod repos;
mod spaces;

pub use jobs::{parse_event_stream, uv_job_spec, JobService, UV_IMAGE};
pub use repos::{RepoService, DEFAULT_REVISION};
pub use spaces::SpaceService;
