//! # judgekit telemetry
//!
//! Structured logging for evaluation runs, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust
//! use judgekit_telemetry::{info, init_telemetry, instance_span};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_telemetry("judgekit")?;
//!
//!     let span = instance_span("review-0");
//!     let _enter = span.enter();
//!     info!("judging instance");
//!     Ok(())
//! }
//! ```

pub mod init;
pub mod spans;

// Re-export tracing macros for convenience
pub use tracing::{Span, debug, error, info, instrument, trace, warn};

pub use init::{LogFormat, init_json_telemetry, init_telemetry, init_with_format};
pub use spans::*;
