//! `evaljobs status`

use anyhow::Result;
use evaljobs_application::ports::{JobPort, RemoteJob};
use evaljobs_domain::EvalJobsError;
use serde::Serialize;

use crate::commands::CommandContext;
use crate::output::Formattable;

/// Snapshot of a job as printed by `status`
#[derive(Debug, Serialize)]
pub struct JobStatusView {
    pub job_id: String,
    pub namespace: String,
    pub stage: String,
    pub models: Option<String>,
    pub message: Option<String>,
    pub url: String,
}

impl From<&RemoteJob> for JobStatusView {
    fn from(job: &RemoteJob) -> Self {
        Self {
            job_id: job.id.clone(),
            namespace: job.namespace.clone(),
            stage: job.stage.to_string(),
            models: job.models_arg().map(str::to_string),
            message: job.message.clone(),
            url: job.url.clone(),
        }
    }
}

impl Formattable for JobStatusView {
    fn key_values(&self) -> Vec<(&'static str, String)> {
        let mut items = vec![
            ("Job", self.job_id.clone()),
            ("Namespace", self.namespace.clone()),
            ("Stage", self.stage.clone()),
        ];
        if let Some(models) = &self.models {
            items.push(("Models", models.clone()));
        }
        if let Some(message) = &self.message {
            items.push(("Message", message.clone()));
        }
        items.push(("URL", self.url.clone()));
        items
    }
}

/// Show the current stage of a job
pub async fn status(ctx: &CommandContext, job_id: String, namespace: Option<String>) -> Result<()> {
    ctx.require_token()?;
    let namespace = ctx.namespace(namespace).await?;
    let job = ctx
        .hub
        .status(&namespace, &job_id)
        .await
        .map_err(|e| EvalJobsError::collection(&job_id, e.message))?;

    println!("{}", JobStatusView::from(&job).format(ctx.format)?);
    Ok(())
}
