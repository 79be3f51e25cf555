use judgekit_core::{CoreError, Llm, LlmRequest, LlmResponse, LlmResponseStream, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted outcome of a [`MockLlm`] call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(String),
    Timeout(Duration),
}

/// A judge backend that replays scripted replies, one per call, in order.
///
/// Once the script is exhausted the default reply is used; without one the
/// call fails with a model error. Every request is recorded for inspection.
pub struct MockLlm {
    name: String,
    script: Mutex<VecDeque<MockReply>>,
    default_reply: Option<String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            default_reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(MockReply::Text(text.into()))
    }

    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.push(MockReply::Error(message.into()))
    }

    pub fn with_timeout(self, after: Duration) -> Self {
        self.push(MockReply::Timeout(after))
    }

    pub fn with_default_reply(mut self, text: impl Into<String>) -> Self {
        self.default_reply = Some(text.into());
        self
    }

    fn push(self, reply: MockReply) -> Self {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
        self
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next_reply(&self) -> Option<MockReply> {
        let scripted = self.script.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        scripted.or_else(|| self.default_reply.clone().map(MockReply::Text))
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_content(&self, req: LlmRequest, _stream: bool) -> Result<LlmResponseStream> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(req);

        let text = match self.next_reply() {
            Some(MockReply::Text(text)) => text,
            Some(MockReply::Error(message)) => return Err(CoreError::Model(message)),
            Some(MockReply::Timeout(after)) => return Err(CoreError::Timeout(after)),
            None => {
                return Err(CoreError::Model(format!("mock '{}' has no reply left", self.name)));
            }
        };

        let stream = async_stream::stream! {
            yield Ok(LlmResponse::text(text));
        };
        Ok(Box::pin(stream))
    }
}
