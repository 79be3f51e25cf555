//! Per-instance task evaluators
//!
//! Each evaluator builds the prompt, calls the judge and extracts a verdict,
//! retrying a bounded number of times when the reply cannot be parsed.
//! Backend failures abort; unparsable replies degrade to a sentinel verdict.

use crate::error::{BackendError, EvalError, Result};
use crate::extract::{Verdict, VerdictExtractor};
use crate::llm_judge::LlmJudge;
use crate::prompt::PromptBuilder;
use crate::report::InstanceResult;
use crate::schema::EvaluationInstance;
use crate::similarity::SimilarityScorer;
use crate::task::Task;
use async_trait::async_trait;
use judgekit_telemetry::{judge_call_span, similarity_span};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;

/// Evaluates single instances of one task.
#[async_trait]
pub trait TaskEvaluator: Send + Sync {
    fn task(&self) -> Task;

    /// Judge one instance. Only backend and template failures are errors.
    async fn evaluate(&self, instance: &EvaluationInstance) -> Result<InstanceResult>;
}

/// Verdict plus the number of judge calls it took
#[derive(Debug, Clone, PartialEq)]
pub struct JudgedVerdict {
    pub verdict: Verdict,
    pub attempts: u32,
}

/// Prompt, call and parse loop shared by all evaluators.
pub struct VerdictJudge {
    prompts: Arc<PromptBuilder>,
    judge: Arc<LlmJudge>,
    extractor: VerdictExtractor,
    max_parse_retries: u32,
}

impl VerdictJudge {
    pub fn new(prompts: Arc<PromptBuilder>, judge: Arc<LlmJudge>, extractor: VerdictExtractor) -> Self {
        Self { prompts, judge, extractor, max_parse_retries: 1 }
    }

    pub fn with_max_parse_retries(mut self, retries: u32) -> Self {
        self.max_parse_retries = retries;
        self
    }

    pub fn model_name(&self) -> &str {
        self.judge.model_name()
    }

    /// Judge `instance`, re-sending the identical prompt after an unparsable
    /// or empty reply. Gives up with [`Verdict::sentinel`].
    pub async fn judge(&self, task: Task, instance: &EvaluationInstance) -> Result<JudgedVerdict> {
        let prompt = self.prompts.build(task, instance)?;
        let max_attempts = self.max_parse_retries.saturating_add(1);

        for attempt in 1..=max_attempts {
            let span = judge_call_span(self.judge.model_name(), attempt);
            let reply = match self.judge.invoke(&prompt).instrument(span).await {
                Ok(text) => self.extractor.extract(&text),
                Err(BackendError::EmptyResponse) => {
                    Err(EvalError::UnparsableVerdict("empty reply".to_string()))
                }
                Err(source) => return Err(EvalError::backend(&instance.id, source)),
            };

            match reply {
                Ok(verdict) => {
                    tracing::debug!(
                        instance.id = %instance.id,
                        label = %verdict.label,
                        confidence = verdict.confidence,
                        attempt,
                        "Verdict extracted"
                    );
                    return Ok(JudgedVerdict { verdict, attempts: attempt });
                }
                Err(e) => {
                    tracing::warn!(instance.id = %instance.id, attempt, max_attempts, error = %e, "Judge reply not parsable");
                }
            }
        }

        tracing::warn!(instance.id = %instance.id, "Recording sentinel verdict");
        Ok(JudgedVerdict { verdict: Verdict::sentinel(), attempts: max_attempts })
    }
}

/// Sentiment judgement of review text
pub struct ReviewEvaluator {
    judge: VerdictJudge,
}

impl ReviewEvaluator {
    pub fn new(judge: VerdictJudge) -> Self {
        Self { judge }
    }
}

#[async_trait]
impl TaskEvaluator for ReviewEvaluator {
    fn task(&self) -> Task {
        Task::Review
    }

    async fn evaluate(&self, instance: &EvaluationInstance) -> Result<InstanceResult> {
        let judged = self.judge.judge(Task::Review, instance).await?;
        Ok(InstanceResult::new(instance, judged.verdict, judged.attempts))
    }
}

/// Quality judgement of a candidate translation, optionally with BLEU/ROUGE
/// against the reference translation.
pub struct TranslationEvaluator {
    judge: VerdictJudge,
    similarity: Option<SimilarityScorer>,
}

impl TranslationEvaluator {
    pub fn new(judge: VerdictJudge) -> Self {
        Self { judge, similarity: None }
    }

    pub fn with_similarity(mut self, enabled: bool) -> Self {
        self.similarity = enabled.then(SimilarityScorer::new);
        self
    }

    /// Scores for instances with both a candidate and a reference; empty otherwise.
    pub fn similarity_scores(&self, instance: &EvaluationInstance) -> BTreeMap<String, f64> {
        let (Some(scorer), Some(candidate), Some(reference)) = (
            self.similarity.as_ref(),
            instance.model_output.as_deref(),
            instance.reference_output.as_deref(),
        ) else {
            return BTreeMap::new();
        };

        let _span = similarity_span(&instance.id).entered();
        scorer.score(candidate, reference)
    }
}

#[async_trait]
impl TaskEvaluator for TranslationEvaluator {
    fn task(&self) -> Task {
        Task::Translation
    }

    async fn evaluate(&self, instance: &EvaluationInstance) -> Result<InstanceResult> {
        // Independent of the verdict; sentinel results still carry scores
        let scores = self.similarity_scores(instance);
        let judged = self.judge.judge(Task::Translation, instance).await?;
        Ok(InstanceResult::new(instance, judged.verdict, judged.attempts).with_extra_scores(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::LabelVocabulary;
    use crate::similarity::{BLEU, ROUGE_L};
    use judgekit_model::MockLlm;
    use std::time::Duration;

    fn verdict_judge(mock: Arc<MockLlm>, task: Task) -> VerdictJudge {
        let extractor = VerdictExtractor::new(LabelVocabulary::new(task.default_labels()).unwrap(), 0.5)
            .unwrap();
        VerdictJudge::new(
            Arc::new(PromptBuilder::builtin().unwrap()),
            Arc::new(LlmJudge::new(mock)),
            extractor,
        )
    }

    #[tokio::test]
    async fn test_review_evaluator_marks_correct() {
        let mock = Arc::new(MockLlm::new("judge").with_reply("Label: positive\nConfidence: 0.9"));
        let evaluator = ReviewEvaluator::new(verdict_judge(mock.clone(), Task::Review));

        let instance = EvaluationInstance::review("7", "A wonderful film", "positive");
        let result = evaluator.evaluate(&instance).await.unwrap();

        assert_eq!(result.instance_id, "7");
        assert!(result.correct);
        assert_eq!(result.verdict.confidence, 0.9);
        assert_eq!(result.attempts, 1);
        assert!(result.extra_scores.is_empty());
        assert_eq!(mock.requests()[0].contents[1].text(), "A wonderful film");
    }

    #[tokio::test]
    async fn test_unparsable_reply_retried_with_same_prompt() {
        let mock = Arc::new(
            MockLlm::new("judge").with_reply("I am not sure.").with_reply("negative, 0.7"),
        );
        let evaluator = ReviewEvaluator::new(verdict_judge(mock.clone(), Task::Review));

        let instance = EvaluationInstance::review("0", "Dull and long", "negative");
        let result = evaluator.evaluate(&instance).await.unwrap();

        assert_eq!(result.verdict.label, "negative");
        assert_eq!(result.attempts, 2);
        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].contents[1].text(), requests[1].contents[1].text());
    }

    #[tokio::test]
    async fn test_persistent_garbage_becomes_sentinel() {
        let mock = Arc::new(MockLlm::new("judge").with_default_reply("no idea"));
        let evaluator = ReviewEvaluator::new(verdict_judge(mock.clone(), Task::Review).with_max_parse_retries(2));

        let instance = EvaluationInstance::review("0", "Hmm", "positive");
        let result = evaluator.evaluate(&instance).await.unwrap();

        assert!(result.is_sentinel());
        assert_eq!(result.verdict.confidence, 0.0);
        assert!(!result.correct);
        assert_eq!(result.attempts, 3);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_reply_is_retried() {
        let mock = Arc::new(MockLlm::new("judge").with_reply("").with_reply("positive"));
        let evaluator = ReviewEvaluator::new(verdict_judge(mock, Task::Review));

        let result =
            evaluator.evaluate(&EvaluationInstance::review("0", "Nice", "positive")).await.unwrap();
        assert_eq!(result.verdict.label, "positive");
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_backend_error_carries_instance_id() {
        let mock = Arc::new(MockLlm::new("judge").with_timeout(Duration::from_secs(5)));
        let evaluator = ReviewEvaluator::new(verdict_judge(mock.clone(), Task::Review));

        let err = evaluator
            .evaluate(&EvaluationInstance::review("r-3", "text", "positive"))
            .await
            .unwrap_err();
        match err {
            EvalError::Backend { instance_id, source } => {
                assert_eq!(instance_id, "r-3");
                assert!(source.is_timeout());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_translation_scores_survive_sentinel() {
        let mock = Arc::new(MockLlm::new("judge").with_default_reply("cannot say"));
        let evaluator =
            TranslationEvaluator::new(verdict_judge(mock, Task::Translation)).with_similarity(true);

        let instance = EvaluationInstance::translation("0", "Le chat dort", "The cat sleeps")
            .with_reference("The cat is sleeping");
        let result = evaluator.evaluate(&instance).await.unwrap();

        assert!(result.is_sentinel());
        assert!(result.extra_scores.contains_key(BLEU));
        assert!(result.extra_scores[ROUGE_L] > 0.0);
    }

    #[tokio::test]
    async fn test_translation_without_reference_or_toggle_has_no_scores() {
        let mock = Arc::new(MockLlm::new("judge").with_default_reply("Label: good, Confidence: 0.8"));
        let enabled =
            TranslationEvaluator::new(verdict_judge(mock.clone(), Task::Translation)).with_similarity(true);
        let disabled = TranslationEvaluator::new(verdict_judge(mock, Task::Translation));

        let unreferenced = EvaluationInstance::translation("0", "Hola", "Hello");
        assert!(enabled.evaluate(&unreferenced).await.unwrap().extra_scores.is_empty());

        let referenced = unreferenced.clone().with_reference("Hello");
        let result = disabled.evaluate(&referenced).await.unwrap();
        assert!(result.extra_scores.is_empty());
        assert_eq!(result.verdict.label, "good");
    }
}
