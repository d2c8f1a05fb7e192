//! The default command: publish an eval, run it remotely and collect results.

use anyhow::Result;
use evaljobs_application::services::{Invocation, RunReport};
use evaljobs_domain::ExportFormat;
use std::sync::Arc;

use crate::commands::CommandContext;
use crate::interactive::ProgressReporter;
use crate::output::{colors, JsonFormatter, OutputFormat, PlainFormatter, TableFormatter};

/// Run one invocation
pub async fn run(
    ctx: &CommandContext,
    invocation: Invocation,
    export: ExportFormat,
    private: bool,
) -> Result<()> {
    let reporter = Arc::new(ProgressReporter::new(ctx.interactive()).with_endpoint(ctx.hub_endpoint()));
    let pipeline = ctx
        .pipeline(ctx.hub.clone().private(private), export)?
        .with_observer(reporter.clone());

    let result = pipeline.run(&invocation, ctx.token()).await;
    reporter.finish();
    let report = result?;

    println!("{}", render(&report, ctx.format)?);
    if invocation.detach && ctx.interactive() {
        for job in &report.jobs {
            eprintln!(
                "{}",
                colors::dim(&format!(
                    "Collect later with: evaljobs collect {} --name {}",
                    job.job_id, invocation.name
                ))
            );
        }
    }
    Ok(())
}

/// Render a run report
pub fn render(report: &RunReport, format: OutputFormat) -> Result<String> {
    let summary = vec![
        ("Eval", format!("{} ({})", report.source, report.source.kind())),
        ("Space", report.space_url.clone()),
        ("Dataset", report.dataset_url.clone()),
    ];

    match format {
        OutputFormat::Json => JsonFormatter::format(report),
        OutputFormat::Table => {
            let rows = report
                .jobs
                .iter()
                .map(|job| {
                    vec![
                        job.job_id.clone(),
                        job.models.clone(),
                        job.stage.clone(),
                        job.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                        job.url.clone(),
                    ]
                })
                .collect();
            Ok(format!(
                "{}\n{}",
                TableFormatter::key_value(&summary),
                TableFormatter::grid(&["Job", "Models", "Stage", "Results", "URL"], rows)
            ))
        }
        OutputFormat::Plain => {
            let mut out = PlainFormatter::key_value(&summary);
            for job in &report.jobs {
                out.push_str(&format!(
                    "\n{} {} {} {}",
                    job.job_id,
                    job.stage,
                    job.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                    job.url
                ));
            }
            Ok(out)
        }
    }
}
