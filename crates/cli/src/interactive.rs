//! Terminal progress for long-running commands

use crate::output::colors;
use evaljobs_application::services::{EventObserver, PipelineEvent};
use evaljobs_domain::BundleStatus;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} {elapsed:.dim}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints pipeline milestones and keeps a spinner on the current step
pub struct ProgressReporter {
    bar: ProgressBar,
    endpoint: Option<String>,
}

impl ProgressReporter {
    /// Reporter with a live spinner, or a silent one
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            spinner("Resolving eval reference")
        } else {
            ProgressBar::hidden()
        };
        Self { bar, endpoint: None }
    }

    /// Print browser URLs of the dataset and Space
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Remove the spinner
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn line(&self, message: String) {
        if !self.bar.is_hidden() {
            self.bar.println(message);
        }
    }
}

impl EventObserver for ProgressReporter {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Resolved { source } => {
                self.line(format!("{} {} eval {}", colors::success("✓"), source.kind(), source));
                self.bar.set_message("Preparing dataset and viewer Space");
            }
            PipelineEvent::LocationReady { location } => {
                self.line(format!("{} Dataset and Space ready: {}", colors::success("✓"), location));
                if let Some(endpoint) = &self.endpoint {
                    self.line(format!("  {}", colors::dim(&location.space_url(endpoint))));
                    self.line(format!("  {}", colors::dim(&location.dataset_url(endpoint))));
                }
                self.bar.set_message("Uploading eval artifacts");
            }
            PipelineEvent::ArtifactsPublished { eval_ref, .. } => {
                self.line(format!("{} Eval reference: {}", colors::success("✓"), eval_ref));
                self.bar.set_message("Submitting job");
            }
            PipelineEvent::JobSubmitted { job, models } => {
                self.line(format!(
                    "{} Job {} submitted for {}\n  {}",
                    colors::success("✓"),
                    colors::bold(&job.id),
                    models,
                    colors::dim(&job.url)
                ));
            }
            PipelineEvent::Waiting { job_id, deadline } => {
                self.bar.set_message(format!(
                    "Waiting for job {} (giving up after {}s)",
                    job_id,
                    deadline.as_secs()
                ));
            }
            PipelineEvent::JobFinished { job } => {
                let stage = job.stage.to_string();
                let mut line = format!("{} Job {} {}", marker(job.stage.is_success()), job.id, colors::stage(&stage));
                if let Some(message) = &job.message {
                    line.push_str(&format!(": {}", message));
                }
                self.line(line);
                self.bar.set_message(format!("Publishing results of job {}", job.id));
            }
            PipelineEvent::ResultsPublished {
                job_id,
                status,
                artifacts,
            } => {
                self.line(format!(
                    "{} Published {} log artifact(s) for job {} ({})",
                    marker(*status == BundleStatus::Complete),
                    artifacts,
                    job_id,
                    status
                ));
            }
        }
    }
}

fn marker(ok: bool) -> colored::ColoredString {
    if ok {
        colors::success("✓")
    } else {
        colors::warning("!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaljobs_domain::EvalSource;

    #[test]
    fn test_hidden_reporter_accepts_events() {
        let reporter = ProgressReporter::new(false);
        reporter.on_event(&PipelineEvent::Resolved {
            source: EvalSource::Package {
                id: "inspect_evals/gpqa_diamond".into(),
            },
        });
        reporter.finish();
        assert!(reporter.bar.is_hidden());
    }
}
