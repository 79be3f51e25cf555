//! LLM judge invocation
//!
//! Sends a system/user prompt pair to the judge backend and returns its raw text.

use crate::error::BackendError;
use crate::prompt::PromptPair;
use futures::StreamExt;
use judgekit_core::{Content, GenerateContentConfig, Llm, LlmRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Thin wrapper around a judge backend.
pub struct LlmJudge {
    model: Arc<dyn Llm>,
    config: LlmJudgeConfig,
}

/// Generation settings for judge calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmJudgeConfig {
    /// Maximum tokens for judge response
    pub max_tokens: u32,
    /// Temperature for judge (low for consistency)
    pub temperature: f32,
    /// Upper bound on a whole judge call, including reading the response
    pub timeout_secs: u64,
}

impl Default for LlmJudgeConfig {
    fn default() -> Self {
        Self { max_tokens: 256, temperature: 0.0, timeout_secs: 120 }
    }
}

impl LlmJudgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl LlmJudge {
    /// Create a new LLM judge with the given model
    pub fn new(model: Arc<dyn Llm>) -> Self {
        Self { model, config: LlmJudgeConfig::default() }
    }

    /// Create with custom config
    pub fn with_config(model: Arc<dyn Llm>, config: LlmJudgeConfig) -> Self {
        Self { model, config }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn config(&self) -> &LlmJudgeConfig {
        &self.config
    }

    /// Send the prompt pair to the judge and collect the full reply text.
    ///
    /// Exceeding the configured timeout yields [`BackendError::Timeout`]; a
    /// reply with no text yields [`BackendError::EmptyResponse`].
    pub async fn invoke(&self, prompt: &PromptPair) -> Result<String, BackendError> {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, self.call_judge(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(timeout)),
        }
    }

    async fn call_judge(&self, prompt: &PromptPair) -> Result<String, BackendError> {
        let request = LlmRequest::new(
            self.model.name(),
            vec![Content::system(&prompt.system), Content::user(&prompt.user)],
        )
        .with_config(GenerateContentConfig {
            temperature: Some(self.config.temperature),
            top_p: None,
            max_output_tokens: Some(i32::try_from(self.config.max_tokens).unwrap_or(i32::MAX)),
        });

        let mut stream = self.model.generate_content(request, false).await?;

        // Collect all response parts
        let mut response_text = String::new();
        while let Some(result) = stream.next().await {
            let response = result?;
            if let Some(message) = response.error_message {
                return Err(BackendError::Model(message));
            }
            if let Some(content) = &response.content {
                for part in &content.parts {
                    if let Some(text) = part.text() {
                        response_text.push_str(text);
                    }
                }
            }
        }

        if response_text.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(response_text)
    }
}
