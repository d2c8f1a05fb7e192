//! Tabular export of inspect eval logs.
//!
//! Every JSON log becomes one row of the `evals` table and one row per sample
//! in the `samples` table. Score columns are the union over all logs, so logs
//! produced by different scorers still line up in a single file.

use evaljobs_domain::{BundleFile, ExportFormat};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::warn;

const EVAL_COLUMNS: &[&str] = &[
    "log",
    "eval_id",
    "run_id",
    "task",
    "model",
    "status",
    "created",
    "total_samples",
    "completed_samples",
];

const SAMPLE_COLUMNS: &[&str] = &["log", "eval_id", "model", "sample_id", "epoch", "input", "target"];

/// Prefix of per-sample scorer columns, keeping them apart from the base columns
pub const SCORE_PREFIX: &str = "score/";

/// Export encoding failures
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV writer failure
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    /// Buffer flush failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct InspectLog {
    #[serde(default)]
    status: String,
    eval: EvalSpec,
    #[serde(default)]
    results: Option<EvalResults>,
    #[serde(default)]
    samples: Vec<EvalSample>,
}

#[derive(Debug, Default, Deserialize)]
struct EvalSpec {
    #[serde(default)]
    eval_id: String,
    #[serde(default)]
    run_id: String,
    #[serde(default)]
    created: String,
    #[serde(default)]
    task: String,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Default, Deserialize)]
struct EvalResults {
    #[serde(default)]
    total_samples: u64,
    #[serde(default)]
    completed_samples: u64,
    #[serde(default)]
    scores: Vec<EvalScore>,
}

#[derive(Debug, Deserialize)]
struct EvalScore {
    name: String,
    #[serde(default)]
    metrics: BTreeMap<String, EvalMetric>,
}

#[derive(Debug, Deserialize)]
struct EvalMetric {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct EvalSample {
    #[serde(default)]
    id: Value,
    #[serde(default = "first_epoch")]
    epoch: u64,
    #[serde(default)]
    input: Value,
    #[serde(default)]
    target: Value,
    #[serde(default)]
    scores: BTreeMap<String, SampleScore>,
}

#[derive(Debug, Deserialize)]
struct SampleScore {
    #[serde(default)]
    value: Value,
}

fn first_epoch() -> u64 {
    1
}

/// One table of the export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    /// Column names, in output order
    pub columns: Vec<String>,
    /// Rows, one value per column
    pub rows: Vec<Vec<Value>>,
}

impl ExportTable {
    fn assemble(base: &[&str], extra: BTreeSet<String>, rows: Vec<BTreeMap<String, Value>>) -> Self {
        let columns: Vec<String> = base
            .iter()
            .map(|c| c.to_string())
            .chain(extra)
            .collect();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .map(|c| row.remove(c).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// RFC 4180 CSV with a header row
    pub fn to_csv(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(cell_text))?;
        }
        writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
    }

    /// One JSON object per line, keys in column order
    pub fn to_jsonl(&self) -> Result<Vec<u8>, ExportError> {
        let mut out = Vec::new();
        for row in &self.rows {
            let object: Map<String, Value> = self
                .columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();
            serde_json::to_writer(&mut out, &object)?;
            out.push(b'\n');
        }
        Ok(out)
    }
}

/// The `evals` and `samples` tables built from a set of logs
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTables {
    /// One row per log
    pub evals: ExportTable,
    /// One row per sample and epoch
    pub samples: ExportTable,
    /// Logs that could not be parsed
    pub skipped: Vec<String>,
    /// Model of each parsed log, by path
    pub models: BTreeMap<String, String>,
}

impl ResultTables {
    /// Build both tables from `(path, content)` pairs.
    ///
    /// Files that are not inspect JSON logs are skipped with a warning.
    pub fn from_logs(logs: &[(String, Vec<u8>)]) -> Self {
        let mut eval_rows = Vec::new();
        let mut sample_rows = Vec::new();
        let mut metric_columns = BTreeSet::new();
        let mut scorer_columns = BTreeSet::new();
        let mut skipped = Vec::new();
        let mut models = BTreeMap::new();

        for (path, content) in logs {
            let log: InspectLog = match serde_json::from_slice(content) {
                Ok(log) => log,
                Err(e) => {
                    warn!("Skipping {} in export: {}", path, e);
                    skipped.push(path.clone());
                    continue;
                }
            };

            models.insert(path.clone(), log.eval.model.clone());
            let results = log.results.unwrap_or_default();
            let mut row = BTreeMap::new();
            row.insert("log".to_string(), Value::from(path.as_str()));
            row.insert("eval_id".to_string(), Value::from(log.eval.eval_id.as_str()));
            row.insert("run_id".to_string(), Value::from(log.eval.run_id.as_str()));
            row.insert("task".to_string(), Value::from(log.eval.task.as_str()));
            row.insert("model".to_string(), Value::from(log.eval.model.as_str()));
            row.insert("status".to_string(), Value::from(log.status.as_str()));
            row.insert("created".to_string(), Value::from(log.eval.created.as_str()));
            row.insert("total_samples".to_string(), Value::from(results.total_samples));
            row.insert("completed_samples".to_string(), Value::from(results.completed_samples));
            for score in &results.scores {
                for (metric, value) in &score.metrics {
                    let column = format!("{}/{}", score.name, metric);
                    metric_columns.insert(column.clone());
                    row.insert(column, value.value.clone());
                }
            }
            eval_rows.push(row);

            for sample in log.samples {
                let mut row = BTreeMap::new();
                row.insert("log".to_string(), Value::from(path.as_str()));
                row.insert("eval_id".to_string(), Value::from(log.eval.eval_id.as_str()));
                row.insert("model".to_string(), Value::from(log.eval.model.as_str()));
                row.insert("sample_id".to_string(), sample.id);
                row.insert("epoch".to_string(), Value::from(sample.epoch));
                row.insert("input".to_string(), Value::from(cell_text(&sample.input)));
                row.insert("target".to_string(), Value::from(cell_text(&sample.target)));
                for (scorer, score) in sample.scores {
                    let column = format!("{}{}", SCORE_PREFIX, scorer);
                    scorer_columns.insert(column.clone());
                    row.insert(column, score.value);
                }
                sample_rows.push(row);
            }
        }

        Self {
            evals: ExportTable::assemble(EVAL_COLUMNS, metric_columns, eval_rows),
            samples: ExportTable::assemble(SAMPLE_COLUMNS, scorer_columns, sample_rows),
            skipped,
            models,
        }
    }

    /// `evals.<ext>` and `samples.<ext>` files; none for [`ExportFormat::None`]
    pub fn to_files(&self, format: ExportFormat) -> Result<Vec<BundleFile>, ExportError> {
        let ext = match format.extension() {
            Some(ext) => ext,
            None => return Ok(Vec::new()),
        };
        let encode = |table: &ExportTable| match format {
            ExportFormat::Jsonl => table.to_jsonl(),
            _ => table.to_csv(),
        };
        Ok(vec![
            BundleFile::new(format!("evals.{}", ext), encode(&self.evals)?),
            BundleFile::new(format!("samples.{}", ext), encode(&self.samples)?),
        ])
    }
}

/// Flatten a JSON value into a single cell.
///
/// Chat inputs (lists of messages) become their text contents joined by
/// newlines.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(cell_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => match (map.get("content"), map.get("text")) {
            (Some(content), _) => cell_text(content),
            (None, Some(Value::String(text))) => text.clone(),
            _ => value.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log(model: &str, accuracy: f64) -> Vec<u8> {
        json!({
            "version": 2,
            "status": "success",
            "eval": {
                "eval_id": format!("eval-{}", model),
                "run_id": "run-1",
                "created": "2025-06-01T10:00:00+00:00",
                "task": "gpqa_diamond",
                "model": model
            },
            "results": {
                "total_samples": 2,
                "completed_samples": 2,
                "scores": [{
                    "name": "choice",
                    "scorer": "choice",
                    "metrics": {
                        "accuracy": {"name": "accuracy", "value": accuracy},
                        "stderr": {"name": "stderr", "value": 0.1}
                    }
                }]
            },
            "samples": [
                {
                    "id": 1,
                    "epoch": 1,
                    "input": [{"role": "user", "content": "What is 2+2, \"roughly\"?"}],
                    "target": "4",
                    "scores": {"choice": {"value": "C"}}
                },
                {
                    "id": "q2",
                    "input": "Name a prime",
                    "target": ["2", "3"],
                    "scores": {"choice": {"value": "I"}}
                }
            ]
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_tables_from_logs() {
        let tables = ResultTables::from_logs(&[
            ("logs/a.json".to_string(), log("openai/gpt-4o", 0.5)),
            ("logs/b.json".to_string(), log("hf/Qwen/Qwen3-8B", 1.0)),
        ]);

        assert_eq!(tables.evals.rows.len(), 2);
        assert_eq!(tables.samples.rows.len(), 4);
        assert!(tables.skipped.is_empty());
        assert_eq!(
            tables.evals.columns[EVAL_COLUMNS.len()..],
            ["choice/accuracy".to_string(), "choice/stderr".to_string()]
        );
        assert_eq!(tables.evals.rows[1][4], json!("hf/Qwen/Qwen3-8B"));
        assert_eq!(tables.evals.rows[1][9], json!(1.0));

        let second = &tables.samples.rows[1];
        assert_eq!(second[3], json!("q2"));
        assert_eq!(second[4], json!(1));
        assert_eq!(second[6], json!("2\n3"));
    }

    #[test]
    fn test_invalid_logs_are_skipped() {
        let tables = ResultTables::from_logs(&[
            ("logs/broken.json".to_string(), b"{not json".to_vec()),
            ("logs/ok.json".to_string(), log("openai/gpt-4o", 0.5)),
        ]);
        assert_eq!(tables.skipped, vec!["logs/broken.json".to_string()]);
        assert_eq!(tables.evals.rows.len(), 1);
    }

    #[test]
    fn test_csv_quoting() {
        let tables = ResultTables::from_logs(&[("logs/a.json".to_string(), log("openai/gpt-4o", 0.5))]);
        let csv = String::from_utf8(tables.samples.to_csv().unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("log,eval_id,model,sample_id,epoch,input,target,score/choice")
        );
        assert_eq!(
            lines.next(),
            Some("logs/a.json,eval-openai/gpt-4o,openai/gpt-4o,1,1,\"What is 2+2, \"\"roughly\"\"?\",4,C")
        );
    }

    #[test]
    fn test_jsonl_keeps_column_order() {
        let tables = ResultTables::from_logs(&[("logs/a.json".to_string(), log("openai/gpt-4o", 0.5))]);
        let jsonl = String::from_utf8(tables.evals.to_jsonl().unwrap()).unwrap();
        assert!(jsonl.starts_with("{\"log\":\"logs/a.json\",\"eval_id\":"));
        let parsed: Value = serde_json::from_str(jsonl.trim()).unwrap();
        assert_eq!(parsed["choice/accuracy"], json!(0.5));
    }

    #[test]
    fn test_export_files() {
        let tables = ResultTables::from_logs(&[]);
        let files = tables.to_files(ExportFormat::Csv).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "evals.csv");
        assert_eq!(
            String::from_utf8(files[0].content.clone()).unwrap(),
            format!("{}\n", EVAL_COLUMNS.join(","))
        );
        assert!(tables.to_files(ExportFormat::None).unwrap().is_empty());
        assert_eq!(tables.to_files(ExportFormat::Jsonl).unwrap()[1].path, "samples.jsonl");
    }

    #[test]
    fn test_scorer_named_like_base_column() {
        let content = json!({
            "status": "success",
            "eval": {"eval_id": "e1", "model": "openai/gpt-4o"},
            "samples": [{
                "id": 1,
                "input": "Capital of France?",
                "target": "Paris",
                "scores": {"target": {"value": 0}, "model": {"value": 1}}
            }]
        })
        .to_string()
        .into_bytes();
        let tables = ResultTables::from_logs(&[("logs/a.json".to_string(), content)]);

        let jsonl = String::from_utf8(tables.samples.to_jsonl().unwrap()).unwrap();
        let row: Value = serde_json::from_str(jsonl.trim()).unwrap();
        assert_eq!(row["target"], json!("Paris"));
        assert_eq!(row["model"], json!("openai/gpt-4o"));
        assert_eq!(row["score/target"], json!(0));
        assert_eq!(row["score/model"], json!(1));
        assert_eq!(
            tables.models.get("logs/a.json").map(String::as_str),
            Some("openai/gpt-4o")
        );
    }
}
