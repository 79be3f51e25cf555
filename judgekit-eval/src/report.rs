//! Evaluation result reporting
//!
//! Structures for per-instance results and the persisted run report.

use crate::error::Result;
use crate::extract::Verdict;
use crate::metrics::OverallMetrics;
use crate::schema::EvaluationInstance;
use crate::task::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Outcome of judging one instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceResult {
    pub instance_id: String,
    pub verdict: Verdict,
    pub reference_label: Option<String>,
    /// Verdict label equals the reference label; always false for sentinels
    pub correct: bool,
    /// Text-similarity scores keyed by metric name
    #[serde(default)]
    pub extra_scores: BTreeMap<String, f64>,
    /// Judge calls spent on this instance
    #[serde(default = "default_attempts")]
    pub attempts: u32,
}

fn default_attempts() -> u32 {
    1
}

impl InstanceResult {
    pub fn new(instance: &EvaluationInstance, verdict: Verdict, attempts: u32) -> Self {
        let correct = !verdict.is_sentinel()
            && instance
                .reference_label
                .as_deref()
                .is_some_and(|reference| labels_match(reference, &verdict.label));

        Self {
            instance_id: instance.id.clone(),
            verdict,
            reference_label: instance.reference_label.clone(),
            correct,
            extra_scores: BTreeMap::new(),
            attempts,
        }
    }

    pub fn with_extra_scores(mut self, scores: BTreeMap<String, f64>) -> Self {
        self.extra_scores = scores;
        self
    }

    pub fn is_sentinel(&self) -> bool {
        self.verdict.is_sentinel()
    }
}

/// Case-insensitive label comparison used for correctness and metrics.
pub(crate) fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

fn labels_match(reference: &str, predicted: &str) -> bool {
    normalize_label(reference) == normalize_label(predicted)
}

/// Identifying information about a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Unique identifier for this evaluation run
    pub run_id: String,
    pub task: Task,
    /// Judge model identifier
    pub judge_model: String,
    /// When the evaluation started
    pub started_at: DateTime<Utc>,
    /// When the evaluation completed
    pub completed_at: DateTime<Utc>,
    /// Instances whose verdict could not be parsed
    pub sentinel_count: usize,
}

/// Complete evaluation report, the only persisted artifact of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: RunMetadata,
    /// Results in input order
    pub individual_results: Vec<InstanceResult>,
    pub overall_results: OverallMetrics,
}

impl Report {
    /// File name the report is saved under for a task
    pub fn file_name(task: Task) -> String {
        format!("{}_results.json", task)
    }

    /// Write the report as pretty JSON into `dir`, creating it if needed.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(self.metadata.task));
        std::fs::write(&path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "Report saved");
        Ok(path)
    }

    /// Read a previously saved report.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Format as a human-readable string
    pub fn format_summary(&self) -> String {
        let metrics = &self.overall_results;
        let duration = self.metadata.completed_at - self.metadata.started_at;

        let mut output = String::new();
        output.push_str(&format!("Evaluation Report: {}\n", self.metadata.run_id));
        output.push_str(&format!("Task: {}\n", self.metadata.task));
        output.push_str(&format!("Judge: {}\n", self.metadata.judge_model));
        output.push_str(&format!("Duration: {:.1}s\n", duration.num_milliseconds() as f64 / 1000.0));
        output.push_str("\nSummary:\n");
        output.push_str(&format!("  Instances: {}\n", metrics.total));
        output.push_str(&format!("  Labelled: {}\n", metrics.labelled));
        output.push_str(&format!("  Unparsable: {}\n", self.metadata.sentinel_count));

        let optional = |name: &str, value: Option<f64>| match value {
            Some(v) => format!("  {}: {:.4}\n", name, v),
            None => format!("  {}: n/a\n", name),
        };
        output.push_str(&optional("Accuracy", metrics.accuracy));
        output.push_str(&optional("Precision", metrics.precision));
        output.push_str(&optional("Recall", metrics.recall));
        output.push_str(&optional("F1", metrics.f1));
        output.push_str(&format!("  Avg Confidence: {:.4}\n", metrics.avg_confidence));

        if !metrics.avg_scores.is_empty() {
            output.push_str("\nAverage Scores:\n");
            for (name, score) in &metrics.avg_scores {
                output.push_str(&format!("  {}: {:.4}\n", name, score));
            }
        }

        if !metrics.per_label.is_empty() {
            output.push_str("\nPer Label:\n");
            for (label, m) in &metrics.per_label {
                output.push_str(&format!(
                    "  {}: precision {:.4}, recall {:.4}, f1 {:.4}, support {}\n",
                    label, m.precision, m.recall, m.f1, m.support
                ));
            }
        }

        output
    }
}
