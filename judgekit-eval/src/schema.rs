//! Dataset schema definitions
//!
//! Input data is a JSON array with one object per instance, stored in a file
//! named after its task (`review.json`, `translation.json`).
//!
//! Review records: `{"id"?, "text", "label"}`.
//! Translation records: `{"id"?, "source", "candidate", "reference"?, "label"?}`;
//! `input_text` / `translated_text` are accepted as aliases for `source` / `candidate`.

use crate::error::{EvalError, Result};
use crate::task::{Field, Task};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// One unit of evaluation data. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInstance {
    pub id: String,
    /// Review text, or the translation source
    pub input_text: String,
    /// Ground-truth label, when the dataset provides one
    #[serde(default)]
    pub reference_label: Option<String>,
    /// Reference translation
    #[serde(default)]
    pub reference_output: Option<String>,
    /// The output being judged (the candidate translation)
    #[serde(default)]
    pub model_output: Option<String>,
}

impl EvaluationInstance {
    pub fn review(id: impl Into<String>, text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            input_text: text.into(),
            reference_label: Some(label.into()),
            reference_output: None,
            model_output: None,
        }
    }

    pub fn translation(
        id: impl Into<String>,
        source: impl Into<String>,
        candidate: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            input_text: source.into(),
            reference_label: None,
            reference_output: None,
            model_output: Some(candidate.into()),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_output = Some(reference.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.reference_label = Some(label.into());
        self
    }

    /// Value of a template field for the given task, if the instance has it.
    pub fn field(&self, task: Task, field: Field) -> Option<&str> {
        match (task, field) {
            (Task::Review, Field::Text) | (Task::Translation, Field::Source) => {
                Some(self.input_text.as_str())
            }
            (Task::Translation, Field::Candidate) => self.model_output.as_deref(),
            (Task::Translation, Field::Reference) => self.reference_output.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReviewRecord {
    #[serde(default)]
    id: Option<Value>,
    text: String,
    label: Value,
}

#[derive(Debug, Deserialize)]
struct TranslationRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(alias = "input_text")]
    source: String,
    #[serde(alias = "translated_text")]
    candidate: String,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    label: Option<Value>,
}

/// Labels may be written as strings, numbers or booleans; they are compared as text.
fn label_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn record_id(id: Option<Value>, index: usize) -> String {
    id.map(label_text).unwrap_or_else(|| index.to_string())
}

/// A task plus its instances, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub task: Task,
    pub instances: Vec<EvaluationInstance>,
}

impl Dataset {
    /// Load a dataset, inferring the task from the file name.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let task = Task::from_data_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            EvalError::Load(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(task, &content)
    }

    pub fn from_json_str(task: Task, content: &str) -> Result<Self> {
        let records: Vec<Value> = serde_json::from_str(content)
            .map_err(|e| EvalError::Load(format!("Expected a JSON array of records: {}", e)))?;
        Self::from_records(task, records)
    }

    pub fn from_records(task: Task, records: Vec<Value>) -> Result<Self> {
        if records.is_empty() {
            return Err(EvalError::Load("Input data for evaluation is empty".to_string()));
        }

        let mut instances = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let instance = match task {
                Task::Review => {
                    let r: ReviewRecord = parse_record(task, index, record)?;
                    EvaluationInstance::review(record_id(r.id, index), r.text, label_text(r.label))
                }
                Task::Translation => {
                    let r: TranslationRecord = parse_record(task, index, record)?;
                    let mut instance =
                        EvaluationInstance::translation(record_id(r.id, index), r.source, r.candidate);
                    if let Some(reference) = r.reference {
                        instance = instance.with_reference(reference);
                    }
                    if let Some(label) = r.label {
                        instance = instance.with_label(label_text(label));
                    }
                    instance
                }
            };
            instances.push(instance);
        }

        let mut seen = HashSet::new();
        if let Some(dup) = instances.iter().find(|i| !seen.insert(i.id.as_str())) {
            return Err(EvalError::Load(format!("Duplicate instance id '{}'", dup.id)));
        }

        Ok(Self { task, instances })
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

fn parse_record<T: serde::de::DeserializeOwned>(task: Task, index: usize, record: Value) -> Result<T> {
    serde_json::from_value(record)
        .map_err(|e| EvalError::Load(format!("{} record {}: {}", task, index, e)))
}
