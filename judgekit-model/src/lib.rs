//! # judgekit-model
//!
//! Backend implementations of [`judgekit_core::Llm`] used as the judge.
//!
//! - [`OpenAiCompatibleClient`] - Any server speaking the OpenAI chat-completions
//!   protocol: a locally hosted vLLM / Ollama / TGI instance or a remote API
//! - [`MockLlm`] - Scripted replies for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use judgekit_model::{OpenAiCompatibleClient, OpenAiCompatibleConfig};
//!
//! let config = OpenAiCompatibleConfig::new("meta-llama/Llama-3.2-3B-Instruct")
//!     .with_base_url("http://localhost:8000/v1");
//! let judge = OpenAiCompatibleClient::new(config).unwrap();
//! ```

pub mod mock;
pub mod openai_compatible;
pub mod retry;

pub use mock::{MockLlm, MockReply};
pub use openai_compatible::{DEFAULT_BASE_URL, OpenAiCompatibleClient, OpenAiCompatibleConfig};
pub use retry::{RetryConfig, execute_with_retry, is_retryable_model_error};
