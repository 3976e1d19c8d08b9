//! The turn loop implementation.

use std::sync::Arc;

use steward_core::error::{Error, ProviderError};
use steward_core::message::{Conversation, Message};
use steward_core::provider::{Provider, ProviderRequest, ToolDefinition, Usage};
use steward_core::tool::{ToolCall, ToolRegistry};
use steward_tools::SharedTodoList;
use tracing::{debug, info, warn};

use crate::assembler::{AssembledResponse, StreamAssembler};
use crate::executor::{ToolExecutor, resolve};
use crate::stream_event::{AgentStreamEvent, EventSender};

/// Appended to the user's message after too many turns without a todo update.
pub const TODO_REMINDER: &str = "<reminder>Update your todos with run_todo.</reminder>";

/// Per-conversation state carried across turns.
pub struct Session {
    pub conversation: Conversation,
    /// Task list shared with this session's `run_todo` tool
    pub todos: SharedTodoList,
    /// Completed turns since the model last touched the task list
    pub rounds_without_todo: u32,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>, todos: SharedTodoList) -> Self {
        Self {
            conversation: Conversation::with_system(system_prompt),
            todos,
            rounds_without_todo: 0,
        }
    }

    /// Start over: keep the system prompt, drop everything else.
    pub async fn reset(&mut self) {
        let system = self
            .conversation
            .messages
            .first()
            .filter(|m| m.role == steward_core::message::Role::System)
            .cloned();

        self.conversation = Conversation::new();
        if let Some(system) = system {
            self.conversation.push(system);
        }
        self.todos.lock().await.clear();
        self.rounds_without_todo = 0;
    }
}

/// Summary of one completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Text of the final assistant message
    pub reply: String,
    /// Whether any tool call this turn targeted the task list
    pub todo_used: bool,
    /// Backend calls made
    pub rounds: u32,
    pub tool_calls_made: usize,
}

/// The core agent loop that orchestrates LLM calls and tool execution.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per response
    max_tokens: Option<u32>,

    executor: ToolExecutor,

    /// Backend calls allowed per turn; 0 means unlimited
    max_rounds: u32,

    /// Use `Provider::stream` instead of `Provider::complete`
    streaming: bool,

    /// Turns without a todo update before the reminder kicks in; 0 disables
    todo_reminder_after: u32,

    events: Option<EventSender>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            executor: ToolExecutor::new(tools),
            max_rounds: 25,
            streaming: false,
            todo_reminder_after: 0,
            events: None,
        }
    }

    /// Set the maximum number of backend calls per turn (0 = unlimited).
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming = enabled;
        self
    }

    pub fn with_todo_reminder_after(mut self, turns: u32) -> Self {
        self.todo_reminder_after = turns;
        self
    }

    /// Publish progress events on `sender` while turns run.
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.executor.registry()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn emit(&self, event: AgentStreamEvent) {
        if let Some(tx) = &self.events {
            // A closed receiver only means nobody is watching
            let _ = tx.send(event);
        }
    }

    /// Run one turn: from the user's input to a reply without tool calls.
    ///
    /// The conversation in `session` is extended in place. On error the
    /// messages appended so far stay, and every assistant message that
    /// requested tools is followed by all of its tool results.
    pub async fn respond(&self, session: &mut Session, user_input: &str) -> Result<TurnOutcome, Error> {
        let result = self.run_turn(session, user_input).await;
        if let Err(e) = &result {
            self.emit(AgentStreamEvent::Error {
                message: e.to_string(),
            });
        }
        result
    }

    async fn run_turn(&self, session: &mut Session, user_input: &str) -> Result<TurnOutcome, Error> {
        let conversation_id = session.conversation.id.to_string();
        info!(
            conversation_id = %conversation_id,
            messages = session.conversation.len(),
            "Processing turn"
        );

        let needs_reminder =
            self.todo_reminder_after > 0 && session.rounds_without_todo >= self.todo_reminder_after;
        let user_message = if needs_reminder {
            debug!(rounds_without_todo = session.rounds_without_todo, "Adding todo reminder");
            format!("{user_input}\n\n{TODO_REMINDER}")
        } else {
            user_input.to_string()
        };
        session.conversation.push(Message::user(user_message));

        let tool_definitions = self.tools().definitions();
        let mut rounds = 0;
        let mut tool_calls_made = 0;
        let mut todo_used = false;
        let mut usage: Option<Usage> = None;

        loop {
            if self.max_rounds != 0 && rounds >= self.max_rounds {
                warn!(
                    conversation_id = %conversation_id,
                    limit = self.max_rounds,
                    "Round limit reached"
                );
                return Err(Error::MaxRoundsExceeded {
                    limit: self.max_rounds,
                });
            }
            rounds += 1;
            debug!(conversation_id = %conversation_id, round = rounds, "Calling backend");

            let response = self
                .call_backend(&session.conversation, &tool_definitions)
                .await?;
            if response.usage.is_some() {
                usage = response.usage;
            }

            let message = response.into_message();
            if !message.requests_tools() {
                let reply = message.content.clone();
                session.conversation.push(message);

                session.rounds_without_todo = if todo_used {
                    0
                } else {
                    session.rounds_without_todo + 1
                };

                self.emit(AgentStreamEvent::Done {
                    conversation_id,
                    usage,
                    rounds,
                    tool_calls_made,
                });
                return Ok(TurnOutcome {
                    reply,
                    todo_used,
                    rounds,
                    tool_calls_made,
                });
            }

            let calls: Vec<ToolCall> = message.tool_calls.iter().map(resolve).collect();
            debug!(tool_count = calls.len(), "Executing tool calls");
            session.conversation.push(message);

            for call in &calls {
                self.emit(AgentStreamEvent::ToolCall {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.arguments.clone(),
                });

                let outcome = self.executor.execute(call).await;
                tool_calls_made += 1;
                todo_used |= outcome.todo_touched;

                self.emit(AgentStreamEvent::ToolResult {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    output: outcome.text.clone(),
                    success: outcome.success,
                });
                session
                    .conversation
                    .push(Message::tool_result(&call.id, outcome.text));
            }
        }
    }

    /// One backend round trip, batch or streaming.
    async fn call_backend(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
    ) -> Result<AssembledResponse, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: conversation.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.to_vec(),
            stream: self.streaming,
        };

        if self.streaming {
            let receiver = self.provider.stream(request).await?;
            StreamAssembler::collect(receiver, |event| {
                if let Some(text) = event.reasoning.as_deref().filter(|t| !t.is_empty()) {
                    self.emit(AgentStreamEvent::Thought {
                        content: text.to_string(),
                    });
                }
                if let Some(text) = event.content.as_deref().filter(|t| !t.is_empty()) {
                    self.emit(AgentStreamEvent::Chunk {
                        content: text.to_string(),
                    });
                }
            })
            .await
        } else {
            let response = AssembledResponse::from(self.provider.complete(request).await?);
            if !response.reasoning.is_empty() {
                self.emit(AgentStreamEvent::Thought {
                    content: response.reasoning.clone(),
                });
            }
            if !response.content.is_empty() {
                self.emit(AgentStreamEvent::Chunk {
                    content: response.content.clone(),
                });
            }
            Ok(response)
        }
    }
}
