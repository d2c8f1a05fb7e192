//! Output formatters

use anyhow::Result;
use serde::Serialize;

/// JSON formatter
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format a value as pretty JSON
    pub fn format<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

/// Plain text formatter
pub struct PlainFormatter;

impl PlainFormatter {
    /// `key: value` lines, keys padded to the same width
    pub fn key_value(items: &[(&str, String)]) -> String {
        let width = items.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        items
            .iter()
            .map(|(key, value)| format!("{:width$} {}", format!("{}:", key), value, width = width + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
