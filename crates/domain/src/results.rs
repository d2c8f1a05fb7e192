//! Result bundles published after a job finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::EvalJobsError;

/// Tabular export written next to the raw logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `evals.csv` and `samples.csv`
    #[default]
    Csv,
    /// `evals.jsonl` and `samples.jsonl`
    Jsonl,
    /// Raw logs only
    None,
}

impl ExportFormat {
    /// File extension, `None` when no export is produced
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Csv => Some("csv"),
            Self::Jsonl => Some("jsonl"),
            Self::None => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = EvalJobsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            "none" | "off" => Ok(Self::None),
            other => Err(EvalJobsError::InvalidRequest(format!(
                "unknown export format '{}', expected csv, jsonl or none",
                other
            ))),
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Jsonl => write!(f, "jsonl"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Whether a bundle holds the full result of a successful job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleStatus {
    /// Job completed; logs and export are final
    Complete,
    /// Job failed or timed out; whatever existed was published
    Incomplete,
}

impl Display for BundleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// One file of a bundle, addressed by its path inside the dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    /// Path inside the repository
    pub path: String,
    /// Raw content
    pub content: Vec<u8>,
}

impl BundleFile {
    /// Create a file entry
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Status manifest stored as `jobs/<job_id>.status.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Remote job identifier
    pub job_id: String,
    /// Browser URL of the job
    pub job_url: Option<String>,
    /// Models evaluated by the job
    pub models: String,
    /// Terminal stage as reported (or `TIMED_OUT`)
    pub stage: String,
    /// Complete or incomplete
    pub status: BundleStatus,
    /// Remote failure message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Inspect log files the export was built from
    pub log_files: Vec<String>,
    /// Export files written alongside
    pub export_files: Vec<String>,
    /// When the bundle was assembled
    pub collected_at: DateTime<Utc>,
}

/// Everything published for one job
#[derive(Debug, Clone)]
pub struct ResultBundle {
    /// Files to commit, manifest included
    pub files: Vec<BundleFile>,
    /// Parsed manifest
    pub manifest: BundleManifest,
}

impl ResultBundle {
    /// Number of log artifacts (console log plus inspect logs)
    pub fn log_artifact_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.path.ends_with(".log"))
            .count()
            + self.manifest.log_files.len()
    }

    /// Whether the bundle is annotated as incomplete
    pub fn is_incomplete(&self) -> bool {
        self.manifest.status == BundleStatus::Incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("jsonl".parse::<ExportFormat>().unwrap(), ExportFormat::Jsonl);
        assert_eq!("none".parse::<ExportFormat>().unwrap(), ExportFormat::None);
        assert!("parquet".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::None.extension(), None);
    }

    #[test]
    fn test_manifest_serialization() {
        let manifest = BundleManifest {
            job_id: "job-1".into(),
            job_url: None,
            models: "openai/gpt-4o".into(),
            stage: "ERROR".into(),
            status: BundleStatus::Incomplete,
            message: Some("OOM".into()),
            log_files: vec!["logs/a.json".into()],
            export_files: vec![],
            collected_at: Utc::now(),
        };
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("\"status\":\"incomplete\""));
        assert!(json.contains("OOM"));
    }
}
