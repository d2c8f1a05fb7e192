//! evaljobs domain types
//!
//! Value types shared by every layer of evaljobs: the resolved eval source,
//! the job request and its parameters, hub repository identifiers, result
//! bundles, and the error taxonomy.
//!
//! ## Modules
//!
//! - **eval_source**: classification of the operator's eval reference
//! - **job**: hardware flavors, timeouts, model lists and job stages
//! - **hosting**: repository ids and the dataset/Space hosting location
//! - **results**: result bundles and their status manifest
//! - **errors**: the error taxonomy surfaced to the operator
//!
//! ## Usage
//!
//! ```rust
//! use evaljobs_domain::{HardwareFlavor, ModelList, Resolver};
//!
//! let resolver = Resolver::new(".");
//! let source = resolver.resolve("inspect_evals/gpqa_diamond").unwrap();
//! assert_eq!(source.kind(), "package");
//!
//! let models = ModelList::parse("openai/gpt-4o,anthropic/claude-3-5-sonnet").unwrap();
//! assert!(models.is_set());
//!
//! let flavor: HardwareFlavor = "a10g-small".parse().unwrap();
//! assert!(flavor.has_gpu());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod eval_source;
pub mod hosting;
pub mod job;
pub mod results;

pub use errors::{EvalJobsError, EvalJobsResult};
pub use eval_source::{EvalSource, Resolver};
pub use hosting::{resolve_url, HostingLocation, RepoId, RepoKind};
pub use job::{
    HardwareFlavor, JobRequest, JobStage, JobTimeout, ModelList, MultiModelPolicy, DEFAULT_FLAVOR,
    DEFAULT_TIMEOUT,
};
pub use results::{BundleFile, BundleManifest, BundleStatus, ExportFormat, ResultBundle};
