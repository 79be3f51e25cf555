//! OpenAI-compatible client implementation.

use super::config::OpenAiCompatibleConfig;
use super::convert::{self, ChatCompletionRequest, ChatCompletionResponse};
use crate::retry::{
    RetryConfig, execute_with_retry, is_retryable_model_error, is_retryable_status_code,
};
use async_trait::async_trait;
use judgekit_core::{CoreError, Llm, LlmRequest, LlmResponseStream};
use reqwest::Client;
use std::time::Duration;

/// Judge backend speaking the OpenAI chat-completions protocol.
///
/// Responses are always delivered as a single complete chunk; the judge needs
/// the whole verdict text before it can parse anything.
pub struct OpenAiCompatibleClient {
    client: Client,
    config: OpenAiCompatibleConfig,
    retry_config: RetryConfig,
}

fn map_transport_error(error: reqwest::Error, timeout: Duration) -> CoreError {
    if error.is_timeout() {
        CoreError::Timeout(timeout)
    } else {
        CoreError::Model(format!("Judge backend request failed: {}", error))
    }
}

impl OpenAiCompatibleClient {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config, retry_config: RetryConfig::default() })
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    pub fn config(&self) -> &OpenAiCompatibleConfig {
        &self.config
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.config.effective_base_url().trim_end_matches('/'))
    }

    fn build_request(&self, request: &LlmRequest) -> ChatCompletionRequest {
        let messages = request.contents.iter().map(convert::content_to_message).collect();
        let generation = request.config.as_ref();

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: generation.and_then(|c| c.temperature),
            top_p: generation.and_then(|c| c.top_p),
            max_tokens: generation
                .and_then(|c| c.max_output_tokens)
                .map(|t| t.max(1) as u32)
                .or(self.config.max_tokens),
            stream: false,
        }
    }
}

#[async_trait]
impl Llm for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(
        &self,
        request: LlmRequest,
        _stream: bool,
    ) -> Result<LlmResponseStream, CoreError> {
        let api_url = self.api_url();
        let chat_request = self.build_request(&request);
        let timeout = self.config.timeout();

        tracing::debug!(url = %api_url, model = %chat_request.model, "Sending judge request");

        let response_text = execute_with_retry(&self.retry_config, is_retryable_model_error, || {
            let mut builder = self.client.post(&api_url).json(&chat_request);
            if let Some(api_key) = &self.config.api_key {
                builder = builder.bearer_auth(api_key);
            }
            async move {
                let response =
                    builder.send().await.map_err(|e| map_transport_error(e, timeout))?;

                let status = response.status();
                if !status.is_success() {
                    let error_text = response.text().await.unwrap_or_default();
                    let retryability = if is_retryable_status_code(status.as_u16()) {
                        "retryable"
                    } else {
                        "non-retryable"
                    };
                    return Err(CoreError::Model(format!(
                        "Judge backend error ({}, {}): {}",
                        status, retryability, error_text
                    )));
                }

                response.text().await.map_err(|e| map_transport_error(e, timeout))
            }
        })
        .await?;

        let chat_response: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                CoreError::Model(format!("Failed to parse response: {} - {}", e, response_text))
            })?;

        let response = convert::from_response(&chat_response);
        Ok(Box::pin(futures::stream::once(async move { Ok(response) })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use judgekit_core::{Content, GenerateContentConfig};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(text: &str) -> serde_json::Value {
        json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]
        })
    }

    fn client_for(server: &MockServer) -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new(
            OpenAiCompatibleConfig::new("judge-model")
                .with_base_url(format!("{}/v1", server.uri()))
                .with_timeout(Duration::from_secs(1)),
        )
        .unwrap()
        .with_retry_config(RetryConfig::disabled())
    }

    fn judge_request() -> LlmRequest {
        LlmRequest::new(
            "judge-model",
            vec![Content::system("Classify the sentiment."), Content::user("Great film!")],
        )
        .with_config(GenerateContentConfig { temperature: Some(0.0), ..Default::default() })
    }

    #[tokio::test]
    async fn test_sends_chat_messages_and_reads_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "judge-model",
                "stream": false,
                "messages": [
                    {"role": "system", "content": "Classify the sentiment."},
                    {"role": "user", "content": "Great film!"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("positive, 0.9")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut stream = client.generate_content(judge_request(), false).await.unwrap();
        let response = stream.next().await.unwrap().unwrap();
        assert_eq!(response.content.unwrap().text(), "positive, 0.9");
    }

    #[tokio::test]
    async fn test_sends_bearer_token_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("negative")))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCompatibleClient::new(
            OpenAiCompatibleConfig::new("judge-model")
                .with_base_url(server.uri())
                .with_api_key("sk-test"),
        )
        .unwrap();
        assert!(client.generate_content(judge_request(), false).await.is_ok());
    }

    #[tokio::test]
    async fn test_http_error_is_model_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let result = client_for(&server).generate_content(judge_request(), false).await;
        match result {
            Err(CoreError::Model(message)) => assert!(message.contains("model not found")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("positive"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).generate_content(judge_request(), false).await;
        assert!(matches!(result, Err(CoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_retries_transient_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("positive")))
            .mount(&server)
            .await;

        let client = client_for(&server).with_retry_config(
            RetryConfig::default().with_initial_delay(Duration::ZERO).with_max_delay(Duration::ZERO),
        );
        let mut stream = client.generate_content(judge_request(), false).await.unwrap();
        let response = stream.next().await.unwrap().unwrap();
        assert_eq!(response.content.unwrap().text(), "positive");
    }
}
