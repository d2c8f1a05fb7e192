//! Testing utilities for evaljobs
//!
//! This crate provides:
//! - `FakeHub`, an in-memory hosting service and job service implementing
//!   both application ports, with call recording and failure injection
//! - Builders and fixtures for inspect JSON logs and invocations
//!
//! # Examples
//!
//! ```
//! use evaljobs_testing::{FakeHub, InspectLogBuilder, JobOutcome};
//!
//! let hub = FakeHub::new("alice");
//! let log = InspectLogBuilder::new("gpqa_diamond", "openai/gpt-4o")
//!     .with_metric("choice", "accuracy", 0.5)
//!     .build();
//! hub.set_job_outcome(JobOutcome::succeeded(vec![("logs/run.json".to_string(), log)]));
//! assert_eq!(hub.call_count(), 0);
//! ```

pub mod builders;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use builders::*;
pub use fixtures::*;
pub use mocks::*;

// Re-export testing dependencies for convenience
pub use proptest;
pub use tempfile;
