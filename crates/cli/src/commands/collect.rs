//! `evaljobs collect`: publish the results of a job submitted earlier.

use anyhow::Result;
use evaljobs_domain::{BundleManifest, ExportFormat, HostingLocation, JobTimeout};
use serde::Serialize;
use std::sync::Arc;

use crate::commands::CommandContext;
use crate::interactive::ProgressReporter;
use crate::output::Formattable;

/// What `collect` prints
#[derive(Debug, Serialize)]
pub struct CollectSummary {
    pub dataset_url: String,
    #[serde(flatten)]
    pub manifest: BundleManifest,
}

impl Formattable for CollectSummary {
    fn key_values(&self) -> Vec<(&'static str, String)> {
        let mut items = vec![
            ("Job", self.manifest.job_id.clone()),
            ("Stage", self.manifest.stage.clone()),
            ("Results", self.manifest.status.to_string()),
            ("Models", self.manifest.models.clone()),
            ("Inspect logs", self.manifest.log_files.len().to_string()),
        ];
        if !self.manifest.export_files.is_empty() {
            items.push(("Exports", self.manifest.export_files.join(", ")));
        }
        items.push(("Dataset", self.dataset_url.clone()));
        items
    }
}

/// Wait for a job (up to `wait`) and publish its results to `name`
pub async fn collect(
    ctx: &CommandContext,
    job_id: String,
    name: String,
    namespace: Option<String>,
    export: ExportFormat,
    wait: JobTimeout,
) -> Result<()> {
    ctx.require_token()?;
    let namespace = ctx.namespace(namespace).await?;
    let location = HostingLocation::new(namespace.as_str(), name.as_str())?;
    let reporter = Arc::new(ProgressReporter::new(ctx.interactive()));
    let pipeline = ctx
        .pipeline(ctx.hub.clone(), export)?
        .with_observer(reporter.clone());

    let result = pipeline
        .collect_job(&job_id, &name, Some(&namespace), wait.duration())
        .await;
    reporter.finish();
    let (_, bundle) = result?;

    let summary = CollectSummary {
        dataset_url: location.dataset_url(&ctx.hub_endpoint()),
        manifest: bundle.manifest,
    };
    println!("{}", summary.format(ctx.format)?);
    Ok(())
}
