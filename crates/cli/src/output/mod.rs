//! Output formatting for the CLI

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod formatters;
mod table;

pub use formatters::{JsonFormatter, PlainFormatter};
pub use table::TableFormatter;

/// Output format of command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Table output (default)
    #[default]
    Table,
    /// Plain text output
    Plain,
}

impl OutputFormat {
    /// Parse output format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "table" => Some(Self::Table),
            "plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Table => write!(f, "table"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

/// Something a command prints as its result
pub trait Formattable: Serialize {
    /// Rows of a key/value view
    fn key_values(&self) -> Vec<(&'static str, String)>;

    /// Format using the specified format
    fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => JsonFormatter::format(self),
            OutputFormat::Table => Ok(TableFormatter::key_value(&self.key_values())),
            OutputFormat::Plain => Ok(PlainFormatter::key_value(&self.key_values())),
        }
    }
}

/// Color helpers
pub mod colors {
    use colored::*;

    pub fn success(s: &str) -> ColoredString {
        s.green()
    }

    pub fn error(s: &str) -> ColoredString {
        s.red()
    }

    pub fn warning(s: &str) -> ColoredString {
        s.yellow()
    }

    pub fn info(s: &str) -> ColoredString {
        s.blue()
    }

    pub fn dim(s: &str) -> ColoredString {
        s.dimmed()
    }

    pub fn bold(s: &str) -> ColoredString {
        s.bold()
    }

    /// Job stage colored by outcome
    pub fn stage(stage: &str) -> ColoredString {
        match stage {
            "COMPLETED" => stage.green(),
            "PENDING" | "RUNNING" => stage.blue(),
            _ => stage.red(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        job_id: String,
    }

    impl Formattable for Sample {
        fn key_values(&self) -> Vec<(&'static str, String)> {
            vec![("Job", self.job_id.clone())]
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("table"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::parse("plain"), Some(OutputFormat::Plain));
        assert_eq!(OutputFormat::parse("invalid"), None);
    }

    #[test]
    fn test_output_format_serialization() {
        let serialized = serde_json::to_string(&OutputFormat::Json).unwrap();
        assert_eq!(serialized, "\"json\"");

        let deserialized: OutputFormat = serde_json::from_str("\"table\"").unwrap();
        assert_eq!(deserialized, OutputFormat::Table);
    }

    #[test]
    fn test_formattable() {
        let sample = Sample {
            job_id: "68a1".to_string(),
        };
        assert!(sample.format(OutputFormat::Json).unwrap().contains("\"job_id\": \"68a1\""));
        assert_eq!(sample.format(OutputFormat::Plain).unwrap(), "Job: 68a1");
        assert!(sample.format(OutputFormat::Table).unwrap().contains("68a1"));
    }
}
