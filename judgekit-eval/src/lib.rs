//! # judgekit-eval
//!
//! LLM-as-judge evaluation pipeline.
//!
//! A judge model reads each dataset instance (a review, or a source sentence
//! with its candidate translation), answers with a label and a confidence, and
//! the answers are scored against reference labels.
//!
//! ## Features
//!
//! - **Prompt templates**: typed user formats validated against the task's fields at startup
//! - **Verdict extraction**: tolerant scanning of free-form judge text for a label and confidence
//! - **Bounded retry**: unparsable replies are retried, then recorded as `unknown`
//! - **Metrics**: accuracy and macro precision/recall/F1, plus BLEU and ROUGE for translations
//! - **Reports**: one ordered JSON report per run
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use judgekit_eval::{EvaluationConfig, Pipeline};
//! use judgekit_model::{OpenAiCompatibleClient, OpenAiCompatibleConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EvaluationConfig::default().with_similarity(true);
//!     let backend = OpenAiCompatibleClient::new(OpenAiCompatibleConfig::new(&config.judge_model))?;
//!
//!     let pipeline = Pipeline::from_config(config, Arc::new(backend))?;
//!     let report = pipeline.run_file("data/translation.json").await?;
//!
//!     println!("{}", report.format_summary());
//!     report.save("./results")?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod llm_judge;
pub mod metrics;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod schema;
pub mod similarity;
pub mod task;

// Re-exports
pub use config::{DEFAULT_JUDGE_MODEL, EvaluationConfig};
pub use error::{BackendError, EvalError, Result};
pub use evaluator::{JudgedVerdict, ReviewEvaluator, TaskEvaluator, TranslationEvaluator, VerdictJudge};
pub use extract::{
    DEFAULT_FALLBACK_CONFIDENCE, LabelVocabulary, UNKNOWN_LABEL, Verdict, VerdictExtractor,
};
pub use llm_judge::{LlmJudge, LlmJudgeConfig};
pub use metrics::{LabelMetrics, OverallMetrics};
pub use pipeline::Pipeline;
pub use prompt::{PromptBuilder, PromptPair, PromptTemplate, UserFormat};
pub use report::{InstanceResult, Report, RunMetadata};
pub use schema::{Dataset, EvaluationInstance};
pub use similarity::SimilarityScorer;
pub use task::{Field, Presence, Task};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::EvaluationConfig;
    pub use crate::error::{BackendError, EvalError, Result};
    pub use crate::evaluator::TaskEvaluator;
    pub use crate::extract::Verdict;
    pub use crate::metrics::OverallMetrics;
    pub use crate::pipeline::Pipeline;
    pub use crate::report::{InstanceResult, Report};
    pub use crate::schema::{Dataset, EvaluationInstance};
    pub use crate::task::Task;
}
