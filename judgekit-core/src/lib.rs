//! # judgekit-core
//!
//! Core traits and types shared by every judgekit crate.
//!
//! ## Overview
//!
//! - [`Llm`] - The text-generation backend boundary used by the judge
//! - [`LlmRequest`] / [`LlmResponse`] - Request and (streamed) response types
//! - [`Content`] / [`Part`] - Chat-style message content
//! - [`CoreError`] / [`Result`] - Unified error handling for backends
//!
//! ## Backends
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait Llm: Send + Sync {
//!     fn name(&self) -> &str;
//!     async fn generate_content(&self, req: LlmRequest, stream: bool) -> Result<LlmResponseStream>;
//! }
//! ```
//!
//! Implementations live in `judgekit-model`.

pub mod error;
pub mod model;
pub mod types;

pub use error::{CoreError, Result};
pub use model::{
    FinishReason, GenerateContentConfig, Llm, LlmRequest, LlmResponse, LlmResponseStream,
    UsageMetadata,
};
pub use types::{Content, Part, ROLE_MODEL, ROLE_SYSTEM, ROLE_USER};
