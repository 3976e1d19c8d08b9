//! Message and Conversation domain types.
//!
//! These are the value objects the turn loop threads through every round:
//! the user speaks, the assistant answers or asks for tools, tools report back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The model
    Assistant,
    /// Tool execution result
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A single message in a conversation.
///
/// `content` is always present; an empty string stands in for a missing
/// body so backends that require the field never see it omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Model reasoning trace, kept apart from `content`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            reasoning: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message with text only.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create an assistant message from any combination of text, reasoning
    /// and tool calls.
    pub fn assistant_response(
        content: impl Into<String>,
        reasoning: Option<String>,
        tool_calls: Vec<MessageToolCall>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content.into());
        msg.reasoning = reasoning.filter(|r| !r.is_empty());
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content.into());
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// Whether this is an assistant message asking for tools.
    pub fn requests_tools(&self) -> bool {
        self.role == Role::Assistant && !self.tool_calls.is_empty()
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Backend-assigned call ID
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as a JSON-encoded string, exactly as the model produced them
    pub arguments: String,
}

/// A conversation is an ordered sequence of messages.
///
/// Append-only: the turn loop pushes, nothing edits in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// Ordered messages
    pub messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a conversation seeded with a system prompt.
    pub fn with_system(prompt: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Message::system(prompt));
        conv
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Check the tool-call linkage invariant: every assistant message with
    /// tool calls is followed by exactly one tool message per call, in the
    /// order the calls were declared.
    pub fn tool_linkage_is_consistent(&self) -> bool {
        let mut i = 0;
        while i < self.messages.len() {
            let msg = &self.messages[i];
            if msg.role == Role::Tool {
                // A tool message outside a tool-call block
                return false;
            }
            if msg.requests_tools() {
                for call in &msg.tool_calls {
                    i += 1;
                    match self.messages.get(i) {
                        Some(reply)
                            if reply.role == Role::Tool
                                && reply.tool_call_id.as_deref() == Some(call.id.as_str()) => {}
                        _ => return false,
                    }
                }
            }
            i += 1;
        }
        true
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: &str, name: &str) -> MessageToolCall {
        MessageToolCall {
            id: id.into(),
            name: name.into(),
            arguments: "{}".into(),
        }
    }

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn assistant_response_keeps_parts_apart() {
        let msg = Message::assistant_response("", Some("thinking".into()), vec![call("c1", "run_bash")]);
        assert_eq!(msg.content, "");
        assert_eq!(msg.reasoning.as_deref(), Some("thinking"));
        assert!(msg.requests_tools());
    }

    #[test]
    fn empty_reasoning_is_dropped() {
        let msg = Message::assistant_response("hi", Some(String::new()), vec![]);
        assert!(msg.reasoning.is_none());
        assert!(!msg.requests_tools());
    }

    #[test]
    fn conversation_tracks_updates() {
        let mut conv = Conversation::new();
        let created = conv.created_at;

        conv.push(Message::user("First message"));
        assert_eq!(conv.len(), 1);
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::tool_result("call_9", "done");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "done");
        assert_eq!(deserialized.role, Role::Tool);
        assert_eq!(deserialized.tool_call_id.as_deref(), Some("call_9"));
    }

    #[test]
    fn linkage_accepts_ordered_replies() {
        let mut conv = Conversation::with_system("sys");
        conv.push(Message::user("go"));
        conv.push(Message::assistant_response("", None, vec![call("a", "x"), call("b", "y")]));
        conv.push(Message::tool_result("a", "1"));
        conv.push(Message::tool_result("b", "2"));
        conv.push(Message::assistant("done"));
        assert!(conv.tool_linkage_is_consistent());
    }

    #[test]
    fn linkage_rejects_swapped_replies() {
        let mut conv = Conversation::new();
        conv.push(Message::assistant_response("", None, vec![call("a", "x"), call("b", "y")]));
        conv.push(Message::tool_result("b", "2"));
        conv.push(Message::tool_result("a", "1"));
        assert!(!conv.tool_linkage_is_consistent());
    }

    #[test]
    fn linkage_rejects_orphan_tool_message() {
        let mut conv = Conversation::new();
        conv.push(Message::user("hi"));
        conv.push(Message::tool_result("zzz", "?"));
        assert!(!conv.tool_linkage_is_consistent());
    }
}
