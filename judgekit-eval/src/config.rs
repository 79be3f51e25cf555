//! Evaluation settings
//!
//! Settings can be read from TOML; missing keys fall back to
//! [`EvaluationConfig::default`].

use crate::error::{EvalError, Result};
use crate::extract::{DEFAULT_FALLBACK_CONFIDENCE, LabelVocabulary, VerdictExtractor};
use crate::llm_judge::LlmJudgeConfig;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_JUDGE_MODEL: &str = "meta-llama/Llama-3.2-3B-Instruct";

/// Configuration for an evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Judge model identifier
    pub judge_model: String,
    /// Confidence used when a label is found without a number
    pub fallback_confidence: f64,
    /// Extra judge calls after an unparsable reply
    pub max_parse_retries: u32,
    /// Instances judged at once; results keep input order regardless
    pub concurrency: usize,
    /// Compute BLEU/ROUGE for translation instances with a reference
    pub enable_similarity: bool,
    pub judge: LlmJudgeConfig,
    /// Directory with `{task}.txt` / `{task}.user.txt` prompt overrides
    pub prompt_dir: Option<PathBuf>,
    /// Per-task label vocabulary overrides, keyed by task name
    pub labels: BTreeMap<String, Vec<String>>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            judge_model: DEFAULT_JUDGE_MODEL.to_string(),
            fallback_confidence: DEFAULT_FALLBACK_CONFIDENCE,
            max_parse_retries: 1,
            concurrency: 1,
            enable_similarity: false,
            judge: LlmJudgeConfig::default(),
            prompt_dir: None,
            labels: BTreeMap::new(),
        }
    }
}

impl EvaluationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EvalError::Config(format!("Invalid TOML: {}", e)))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EvalError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_judge_model(mut self, model: impl Into<String>) -> Self {
        self.judge_model = model.into();
        self
    }

    pub fn with_similarity(mut self, enabled: bool) -> Self {
        self.enable_similarity = enabled;
        self
    }

    pub fn with_fallback_confidence(mut self, confidence: f64) -> Self {
        self.fallback_confidence = confidence;
        self
    }

    pub fn with_max_parse_retries(mut self, retries: u32) -> Self {
        self.max_parse_retries = retries;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Check the settings make sense for `task`. Runs before any instance is judged.
    pub fn validate(&self, task: Task) -> Result<()> {
        if self.judge_model.trim().is_empty() {
            return Err(EvalError::Config("Judge model identifier is empty".to_string()));
        }
        if self.enable_similarity && task != Task::Translation {
            return Err(EvalError::Config(format!(
                "BLEU/ROUGE metrics are only available for the translation task, not '{}'",
                task
            )));
        }
        if self.concurrency == 0 {
            return Err(EvalError::Config("Concurrency must be at least 1".to_string()));
        }
        for name in self.labels.keys() {
            name.parse::<Task>()?;
        }
        self.extractor(task).map(|_| ())
    }

    /// Label vocabulary for `task`, honouring overrides.
    pub fn vocabulary(&self, task: Task) -> Result<LabelVocabulary> {
        match self.labels.get(task.name()) {
            Some(labels) => LabelVocabulary::new(labels),
            None => LabelVocabulary::new(task.default_labels()),
        }
    }

    pub fn extractor(&self, task: Task) -> Result<VerdictExtractor> {
        VerdictExtractor::new(self.vocabulary(task)?, self.fallback_confidence)
    }
}
