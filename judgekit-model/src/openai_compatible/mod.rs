//! OpenAI-compatible chat-completions backend.
//!
//! Most local inference servers (vLLM, Ollama, llama.cpp server, TGI) and hosted
//! APIs expose the `/chat/completions` endpoint, so one client covers both a
//! locally hosted judge model and a remote one.
//!
//! # Example
//!
//! ```rust,ignore
//! use judgekit_model::{OpenAiCompatibleClient, OpenAiCompatibleConfig};
//!
//! // vLLM serving Llama locally
//! let local = OpenAiCompatibleClient::new(
//!     OpenAiCompatibleConfig::new("meta-llama/Llama-3.2-3B-Instruct"),
//! )?;
//!
//! // Hosted API
//! let remote = OpenAiCompatibleClient::new(
//!     OpenAiCompatibleConfig::new("gpt-4o-mini")
//!         .with_base_url("https://api.openai.com/v1")
//!         .with_api_key(std::env::var("OPENAI_API_KEY").unwrap()),
//! )?;
//! ```

mod client;
mod config;
mod convert;

pub use client::OpenAiCompatibleClient;
pub use config::{DEFAULT_BASE_URL, OpenAiCompatibleConfig};
