//! Span helpers for evaluation runs
//!
//! Pre-configured spans for the run, each instance, each judge call and the
//! text-similarity computation.

use tracing::Span;

/// Create a span covering a whole evaluation run
///
/// # Example
/// ```
/// use judgekit_telemetry::evaluation_run_span;
/// let span = evaluation_run_span("review", "meta-llama/Llama-3.2-3B-Instruct");
/// let _enter = span.enter();
/// ```
pub fn evaluation_run_span(task: &str, model_name: &str) -> Span {
    tracing::info_span!("evaluation.run", task = task, model.name = model_name)
}

/// Create a span for one dataset instance
pub fn instance_span(instance_id: &str) -> Span {
    tracing::info_span!("evaluation.instance", instance.id = instance_id)
}

/// Create a span for a judge backend call
///
/// # Arguments
/// * `model_name` - Judge model identifier
/// * `attempt` - 1-based attempt number within the parse-retry budget
pub fn judge_call_span(model_name: &str, attempt: u32) -> Span {
    tracing::debug_span!("judge.call", model.name = model_name, attempt = attempt)
}

/// Create a span for BLEU/ROUGE scoring of one instance
pub fn similarity_span(instance_id: &str) -> Span {
    tracing::debug_span!("similarity.score", instance.id = instance_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_can_be_entered() {
        let run = evaluation_run_span("translation", "judge");
        let _run = run.enter();
        let instance = instance_span("3");
        let _instance = instance.enter();
        let call = judge_call_span("judge", 1);
        let _call = call.enter();
        let sim = similarity_span("3");
        let _sim = sim.enter();
    }
}
