//! CLI commands

pub mod collect;
pub mod config;
pub mod logs;
pub mod run;
pub mod status;

use crate::config::Config;
use crate::hub::HubAdapter;
use crate::output::OutputFormat;
use anyhow::{Context, Result};
use evaljobs_application::ports::HostingPort;
use evaljobs_application::services::{EvalPipeline, TOKEN_SECRET};
use evaljobs_domain::{EvalJobsError, ExportFormat, Resolver};
use evaljobs_sdk::Client;
use std::sync::Arc;

/// Context passed to all commands
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
    pub hub: HubAdapter,
    token: Option<String>,
}

impl CommandContext {
    /// Create a new command context
    pub fn new(config: Config, format: OutputFormat, token: Option<String>) -> Result<Self> {
        let token = token.filter(|t| !t.trim().is_empty());
        let mut builder = Client::builder()
            .base_url(config.hub_endpoint.as_str())
            .debug(config.debug);
        if let Some(token) = &token {
            builder = builder.token(token.as_str());
        }
        let client = builder.build().context("Failed to create hub client")?;

        Ok(Self {
            hub: HubAdapter::new(client),
            config,
            format,
            token,
        })
    }

    /// Access token, if any
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Access token, or the missing-credentials error
    pub fn require_token(&self) -> Result<&str, EvalJobsError> {
        self.token()
            .ok_or_else(|| EvalJobsError::MissingCredentials(TOKEN_SECRET.to_string()))
    }

    /// Namespace to use: `explicit`, or the token's account
    pub async fn namespace(&self, explicit: Option<String>) -> Result<String> {
        match explicit {
            Some(ns) => Ok(ns),
            None => {
                let name = self
                    .hub
                    .whoami()
                    .await
                    .map_err(|e| EvalJobsError::publish("whoami", e.message))?;
                Ok(name)
            }
        }
    }

    /// Pipeline over the hub, resolving local scripts from the working directory
    pub fn pipeline(&self, hub: HubAdapter, export: ExportFormat) -> Result<EvalPipeline<HubAdapter, HubAdapter>> {
        let hub = Arc::new(hub);
        Ok(EvalPipeline::new(
            Arc::clone(&hub),
            hub,
            Resolver::from_current_dir()?,
            self.config.pipeline_config(export),
        ))
    }

    /// Base URL of the hub
    pub fn hub_endpoint(&self) -> String {
        self.hub.endpoint()
    }

    /// Whether human-oriented progress should be drawn
    pub fn interactive(&self) -> bool {
        self.format != OutputFormat::Json
    }
}
