//! Wire types and conversions for the chat-completions protocol.

use judgekit_core::{Content, FinishReason, LlmResponse, ROLE_MODEL, UsageMetadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Convert a judgekit content into a chat message. The model role is called
/// `assistant` on the wire.
pub fn content_to_message(content: &Content) -> Message {
    let role = if content.role == ROLE_MODEL { "assistant" } else { content.role.as_str() };
    Message { role: role.to_string(), content: Some(content.text()) }
}

fn finish_reason(raw: &str) -> FinishReason {
    match raw {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::MaxTokens,
        "content_filter" => FinishReason::Safety,
        _ => FinishReason::Other,
    }
}

pub fn from_response(response: &ChatCompletionResponse) -> LlmResponse {
    let choice = response.choices.first();
    let text = choice.and_then(|c| c.message.as_ref()).and_then(|m| m.content.clone());

    LlmResponse {
        content: text.map(|t| Content::new(ROLE_MODEL).with_text(t)),
        usage_metadata: response.usage.as_ref().map(|u| UsageMetadata {
            prompt_token_count: u.prompt_tokens as i32,
            candidates_token_count: u.completion_tokens as i32,
            total_token_count: u.total_tokens as i32,
        }),
        finish_reason: choice.and_then(|c| c.finish_reason.as_deref()).map(finish_reason),
        partial: false,
        turn_complete: true,
        error_message: None,
    }
}
