//! Pipeline orchestration
//!
//! Walks a dataset in file order, evaluates every instance and aggregates the
//! results into a [`Report`].

use crate::config::EvaluationConfig;
use crate::error::{EvalError, Result};
use crate::evaluator::{ReviewEvaluator, TaskEvaluator, TranslationEvaluator, VerdictJudge};
use crate::llm_judge::LlmJudge;
use crate::metrics::OverallMetrics;
use crate::prompt::PromptBuilder;
use crate::report::{InstanceResult, Report, RunMetadata};
use crate::schema::Dataset;
use crate::task::Task;
use futures::{StreamExt, TryStreamExt};
use judgekit_core::Llm;
use judgekit_telemetry::{evaluation_run_span, instance_span};
use std::path::Path;
use std::sync::Arc;
use tracing::Instrument;

/// Drives evaluation runs against one judge backend.
///
/// Prompt templates and the backend handle are fixed at construction and
/// shared read-only by every instance.
pub struct Pipeline {
    config: EvaluationConfig,
    prompts: Arc<PromptBuilder>,
    judge: Arc<LlmJudge>,
}

impl Pipeline {
    pub fn new(config: EvaluationConfig, prompts: PromptBuilder, model: Arc<dyn Llm>) -> Self {
        let judge = Arc::new(LlmJudge::with_config(model, config.judge.clone()));
        Self { config, prompts: Arc::new(prompts), judge }
    }

    /// Pipeline using the built-in prompts, or those in `config.prompt_dir`.
    pub fn from_config(config: EvaluationConfig, model: Arc<dyn Llm>) -> Result<Self> {
        let prompts = match &config.prompt_dir {
            Some(dir) => PromptBuilder::from_dir(dir)?,
            None => PromptBuilder::builtin()?,
        };
        Ok(Self::new(config, prompts, model))
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Validate settings for `task` and build its evaluator.
    pub fn evaluator(&self, task: Task) -> Result<Box<dyn TaskEvaluator>> {
        self.config.validate(task)?;
        self.prompts.template(task)?;

        let judge =
            VerdictJudge::new(self.prompts.clone(), self.judge.clone(), self.config.extractor(task)?)
                .with_max_parse_retries(self.config.max_parse_retries);

        Ok(match task {
            Task::Review => Box::new(ReviewEvaluator::new(judge)),
            Task::Translation => Box::new(
                TranslationEvaluator::new(judge).with_similarity(self.config.enable_similarity),
            ),
        })
    }

    /// Load `{task}.json` and evaluate it.
    pub async fn run_file(&self, path: impl AsRef<Path>) -> Result<Report> {
        let task = Task::from_data_path(path.as_ref())?;
        // Configuration problems surface before the data is read
        self.evaluator(task)?;
        let dataset = Dataset::load(path)?;
        self.run(&dataset).await
    }

    /// Evaluate every instance and aggregate.
    ///
    /// The first backend failure aborts the run and no report is produced.
    pub async fn run(&self, dataset: &Dataset) -> Result<Report> {
        let task = dataset.task;
        let evaluator = self.evaluator(task)?;

        let started_at = chrono::Utc::now();
        let run_id = format!("{}_{}", task, uuid::Uuid::new_v4());
        let span = evaluation_run_span(task.name(), self.judge.model_name());

        let results = self.evaluate_all(evaluator.as_ref(), dataset).instrument(span.clone()).await?;
        let overall_results = OverallMetrics::from_results(&results)?;
        let sentinel_count = results.iter().filter(|r| r.is_sentinel()).count();

        span.in_scope(|| {
            tracing::info!(
                run_id = %run_id,
                instances = results.len(),
                sentinels = sentinel_count,
                accuracy = ?overall_results.accuracy,
                "Evaluation finished"
            );
        });

        Ok(Report {
            metadata: RunMetadata {
                run_id,
                task,
                judge_model: self.judge.model_name().to_string(),
                started_at,
                completed_at: chrono::Utc::now(),
                sentinel_count,
            },
            individual_results: results,
            overall_results,
        })
    }

    async fn evaluate_all(
        &self,
        evaluator: &dyn TaskEvaluator,
        dataset: &Dataset,
    ) -> Result<Vec<InstanceResult>> {
        let total = dataset.len();
        tracing::info!(instances = total, concurrency = self.config.concurrency, "Evaluation started");

        // `buffered` yields in input order, and stops pulling new instances
        // once an error has been returned.
        futures::stream::iter(dataset.instances.iter().enumerate())
            .map(|(index, instance)| {
                async move {
                    let result = evaluator.evaluate(instance).await?;
                    tracing::debug!(
                        index = index + 1,
                        total,
                        correct = result.correct,
                        "Instance evaluated"
                    );
                    Ok::<_, EvalError>(result)
                }
                .instrument(instance_span(&instance.id))
            })
            .buffered(self.config.concurrency.max(1))
            .try_collect()
            .await
    }
}
