//! Agent-level streaming events.
//!
//! `AgentStreamEvent` lifts provider deltas and tool activity into events a
//! front end can render while a turn is still running.

use serde::{Deserialize, Serialize};
use steward_core::provider::Usage;
use tokio::sync::mpsc;

/// Sending half of the agent event channel.
pub type EventSender = mpsc::UnboundedSender<AgentStreamEvent>;

/// Events emitted by the agent during a turn.
///
/// - `chunk`      : partial answer text from the model
/// - `thought`    : partial reasoning text from the model
/// - `tool_call`  : the agent is invoking a tool
/// - `tool_result`: tool execution completed
/// - `done`       : the turn is complete
/// - `error`      : the turn failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// Partial text token from the model.
    Chunk { content: String },

    /// Partial reasoning text.
    Thought { content: String },

    /// The agent is calling a tool.
    ToolCall {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Tool execution completed.
    ToolResult {
        id: String,
        name: String,
        output: String,
        success: bool,
    },

    /// The turn is complete.
    Done {
        conversation_id: String,
        usage: Option<Usage>,
        rounds: u32,
        tool_calls_made: usize,
    },

    /// The turn ended with an error.
    Error { message: String },
}

impl AgentStreamEvent {
    /// Event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Thought { .. } => "thought",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}
