//! evaljobs CLI library
//!
//! Command implementations, configuration, the hub adapter that implements
//! the application ports over the SDK, terminal output and logging setup.

pub mod commands;
pub mod config;
pub mod hub;
pub mod interactive;
pub mod output;
pub mod telemetry;

pub use config::Config;
pub use hub::HubAdapter;
pub use output::{JsonFormatter, OutputFormat, PlainFormatter, TableFormatter};

/// Re-export common types
pub use anyhow::{Context, Result};
