//! Builders for inspect eval logs.

use serde_json::{json, Value};

/// Builds the JSON form of an inspect eval log
#[derive(Debug, Clone)]
pub struct InspectLogBuilder {
    task: String,
    model: String,
    status: String,
    run_id: String,
    metrics: Vec<(String, String, f64)>,
    samples: Vec<Value>,
}

impl InspectLogBuilder {
    /// Successful log for `task` run against `model`
    pub fn new(task: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            model: model.into(),
            status: "success".to_string(),
            run_id: "run-1".to_string(),
            metrics: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Set the log status (`success`, `error`, `started`, ...)
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Set the run id
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Add an aggregate metric of a scorer
    pub fn with_metric(mut self, scorer: &str, metric: &str, value: f64) -> Self {
        self.metrics.push((scorer.to_string(), metric.to_string(), value));
        self
    }

    /// Add a sample scored by `scorer`
    pub fn with_sample(mut self, id: impl Into<Value>, input: &str, target: &str, scorer: &str, score: &str) -> Self {
        self.samples.push(json!({
            "id": id.into(),
            "epoch": 1,
            "input": input,
            "target": target,
            "scores": { scorer: { "value": score } }
        }));
        self
    }

    /// JSON value of the log
    pub fn to_value(&self) -> Value {
        let mut scores: Vec<Value> = Vec::new();
        for (scorer, metric, value) in &self.metrics {
            match scores.iter_mut().find(|s| s["name"] == scorer.as_str()) {
                Some(score) => {
                    score["metrics"][metric] = json!({ "name": metric, "value": value });
                }
                None => scores.push(json!({
                    "name": scorer,
                    "scorer": scorer,
                    "metrics": { metric: { "name": metric, "value": value } }
                })),
            }
        }

        json!({
            "version": 2,
            "status": self.status,
            "eval": {
                "eval_id": format!("{}-{}", self.task, self.model.replace('/', "-")),
                "run_id": self.run_id,
                "created": "2025-06-01T10:00:00+00:00",
                "task": self.task,
                "model": self.model
            },
            "results": {
                "total_samples": self.samples.len(),
                "completed_samples": self.samples.len(),
                "scores": scores
            },
            "samples": self.samples
        })
    }

    /// Serialized log
    pub fn build(&self) -> Vec<u8> {
        self.to_value().to_string().into_bytes()
    }
}
