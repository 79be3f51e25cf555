//! Evaluation tasks and the instance fields each one provides.

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The kinds of judgement this crate knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Sentiment classification of a review
    Review,
    /// Quality judgement of a candidate translation
    Translation,
}

/// An instance field that prompt templates may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Text,
    Source,
    Candidate,
    Reference,
}

/// Whether a task's instances always carry a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

impl Task {
    pub const ALL: [Task; 2] = [Task::Review, Task::Translation];

    pub fn name(self) -> &'static str {
        match self {
            Task::Review => "review",
            Task::Translation => "translation",
        }
    }

    /// Infer the task from a data file named `{task_name}.json`.
    pub fn from_data_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
            EvalError::Config(format!("Cannot infer task from path '{}'", path.display()))
        })?;
        stem.parse()
    }

    /// Closed label vocabulary used when no override is configured.
    pub fn default_labels(self) -> &'static [&'static str] {
        match self {
            Task::Review => &["positive", "negative"],
            Task::Translation => &["good", "bad"],
        }
    }

    /// Which fields this task's instances provide, or `None` if never.
    pub fn field_presence(self, field: Field) -> Option<Presence> {
        match (self, field) {
            (Task::Review, Field::Text) => Some(Presence::Required),
            (Task::Translation, Field::Source | Field::Candidate) => Some(Presence::Required),
            (Task::Translation, Field::Reference) => Some(Presence::Optional),
            _ => None,
        }
    }
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Text => "text",
            Field::Source => "source",
            Field::Candidate => "candidate",
            Field::Reference => "reference",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Field::Text),
            "source" => Some(Field::Source),
            "candidate" => Some(Field::Candidate),
            "reference" => Some(Field::Reference),
            _ => None,
        }
    }
}

impl FromStr for Task {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "review" => Ok(Task::Review),
            "translation" => Ok(Task::Translation),
            other => Err(EvalError::Config(format!(
                "Unknown task: '{}'. Valid tasks are: {}",
                other,
                Task::ALL.map(Task::name).join(", ")
            ))),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
