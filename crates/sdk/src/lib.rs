//! # evaljobs SDK
//!
//! Typed async client for the hub REST API used by evaljobs: repositories
//! (datasets and Spaces), Space variables, and remote jobs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use evaljobs_sdk::{Client, RepoId, RepoKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder().token("hf_xxx").build()?;
//!
//!     let me = client.whoami().await?;
//!     let repo = RepoId::new(me.name, "my-eval")?;
//!     let files = client.repos().list_files(RepoKind::Dataset, &repo, "logs").await?;
//!     println!("{} log files", files.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! - `HF_ENDPOINT`: hub base URL (default `https://huggingface.co`)
//! - `HF_TOKEN`: access token
//!
//! ## Error Handling
//!
//! Every call is attempted once. Non-success answers are mapped to
//! [`SdkError`] with the hub's message preserved.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

// Re-exports
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use error::{SdkError, SdkResult};
pub use models::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{Client, ClientBuilder};
    pub use crate::config::ClientConfig;
    pub use crate::error::{SdkError, SdkResult};
    pub use crate::models::*;
    pub use crate::services::*;
}

/// SDK version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default hub URL
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";
