//! LLM access for the Mindful pipeline.
//!
//! One synchronous completion per prompt against an external provider.
//! No streaming and no retries; a failed call fails the request.

pub mod config;
pub mod json;
pub mod prompts;
pub mod providers;
pub mod types;

pub use config::LLMConfig;
pub use json::ParseOutcome;
pub use providers::{CompletionModel, ProviderClient};
pub use types::*;
