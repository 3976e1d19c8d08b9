//! LLM backends for Steward.
//!
//! Every backend speaks the OpenAI chat-completions protocol and implements
//! `steward_core::Provider`. The router picks one based on configuration.

pub mod openai_compat;
pub mod router;
pub mod wire;

pub use openai_compat::{OpenAiCompatProvider, RetryPolicy};
pub use router::{ProviderRouter, build_from_config, resolve_model};
