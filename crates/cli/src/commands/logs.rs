//! `evaljobs logs`

use anyhow::Result;
use evaljobs_application::ports::JobPort;
use evaljobs_domain::EvalJobsError;

use crate::commands::CommandContext;
use crate::output::{JsonFormatter, OutputFormat};

/// Print the console output of a job
pub async fn logs(ctx: &CommandContext, job_id: String, namespace: Option<String>) -> Result<()> {
    ctx.require_token()?;
    let namespace = ctx.namespace(namespace).await?;
    let lines = ctx
        .hub
        .logs(&namespace, &job_id)
        .await
        .map_err(|e| EvalJobsError::collection(&job_id, e.message))?;

    match ctx.format {
        OutputFormat::Json => println!("{}", JsonFormatter::format(&lines)?),
        _ => {
            for line in &lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
