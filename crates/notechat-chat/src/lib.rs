//! RAG chat: prompt rendering, completion backends, conversation types.
//!
//! LLM calls go to the hosted Cohere generate API. Degenerate completions
//! are replaced with canned answers rather than reported as errors.

pub mod config;
pub mod prompt;
pub mod providers;
pub mod types;

pub use config::GenerationConfig;
pub use prompt::{render, Verbosity};
pub use providers::{complete, CohereCompleter, CompletionBackend, Generation};
pub use types::*;
