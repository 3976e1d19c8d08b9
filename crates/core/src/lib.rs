//! # Steward Core
//!
//! Domain types, traits, and error definitions for the Steward tool-use agent.
//! This crate has **no transport or tool dependencies**: it defines the
//! conversation model, the provider contract, and the tool registry that every
//! other crate implements against.
//!
//! - [`message`]: role-tagged conversation entries and tool-call records
//! - [`provider`]: the backend contract (batch and streaming)
//! - [`tool`]: the tool trait and the name-keyed registry
//! - [`error`]: the error taxonomy

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamEvent, ToolCallDelta};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
