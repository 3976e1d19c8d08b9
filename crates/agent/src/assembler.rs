//! Stream assembler: folds provider deltas into one complete response.
//!
//! Tool-call fragments are grouped by their per-turn `index`. For each
//! call, the first non-empty `id` fragment wins, `name` fragments are
//! merged so an echoed name never duplicates, and every `arguments`
//! fragment is appended in arrival order. Nothing is emitted before the
//! stream ends, so a partially streamed call is never executed.
//!
//! Both the streamed and the complete path give every call an id; one the
//! provider left blank is synthesized so results can always be linked.

use std::collections::BTreeMap;

use steward_core::error::ProviderError;
use steward_core::message::{Message, MessageToolCall};
use steward_core::provider::{EventStream, ProviderResponse, StreamEvent, Usage};
use tracing::warn;

/// A fully assembled assistant response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledResponse {
    pub content: String,
    pub reasoning: String,
    /// Finalized calls in ascending index order
    pub tool_calls: Vec<MessageToolCall>,
    pub usage: Option<Usage>,
}

impl AssembledResponse {
    /// Convert into the assistant message appended to the conversation.
    pub fn into_message(self) -> Message {
        let reasoning = Some(self.reasoning).filter(|r| !r.is_empty());
        Message::assistant_response(self.content, reasoning, self.tool_calls)
    }
}

impl From<ProviderResponse> for AssembledResponse {
    fn from(response: ProviderResponse) -> Self {
        let message = response.message;
        Self {
            content: message.content,
            reasoning: message.reasoning.unwrap_or_default(),
            tool_calls: message
                .tool_calls
                .into_iter()
                .enumerate()
                .map(|(index, mut call)| {
                    ensure_call_id(&mut call, index);
                    call
                })
                .collect(),
            usage: response.usage,
        }
    }
}

/// Fill in an id for a call the provider sent without one.
fn ensure_call_id(call: &mut MessageToolCall, index: usize) {
    if !call.id.is_empty() {
        return;
    }
    call.id = format!("call_{}", uuid::Uuid::new_v4().simple());
    warn!(index, id = %call.id, name = %call.name, "Tool call arrived without an id, synthesizing one");
}

#[derive(Debug, Default)]
struct ToolCallBuilder {
    id: String,
    name: String,
    arguments: String,
}

impl ToolCallBuilder {
    /// A fragment the name already ends with is a repeat and is dropped.
    /// One that starts with the name so far is a cumulative snapshot and
    /// replaces it. Anything else continues it.
    fn merge_name(&mut self, fragment: &str) {
        if fragment.is_empty() || self.name.ends_with(fragment) {
            return;
        }
        if fragment.starts_with(self.name.as_str()) {
            self.name.clear();
        }
        self.name.push_str(fragment);
    }
}

/// Incremental fold over [`StreamEvent`]s.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    content: String,
    reasoning: String,
    calls: BTreeMap<u32, ToolCallBuilder>,
    usage: Option<Usage>,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the running state.
    pub fn apply(&mut self, event: &StreamEvent) {
        if let Some(text) = &event.content {
            self.content.push_str(text);
        }
        if let Some(text) = &event.reasoning {
            self.reasoning.push_str(text);
        }

        for delta in &event.tool_calls {
            let call = self.calls.entry(delta.index).or_default();

            if let Some(id) = delta.id.as_deref()
                && call.id.is_empty()
            {
                call.id.push_str(id);
            }
            if let Some(name) = delta.name.as_deref() {
                call.merge_name(name);
            }
            if let Some(arguments) = &delta.arguments {
                call.arguments.push_str(arguments);
            }
        }

        if event.usage.is_some() {
            self.usage = event.usage;
        }
    }

    /// Finalize the stream.
    pub fn finish(self) -> AssembledResponse {
        let tool_calls = self
            .calls
            .into_iter()
            .map(|(index, call)| {
                let mut call = MessageToolCall {
                    id: call.id,
                    name: call.name,
                    arguments: call.arguments,
                };
                ensure_call_id(&mut call, index as usize);
                call
            })
            .collect();

        AssembledResponse {
            content: self.content,
            reasoning: self.reasoning,
            tool_calls,
            usage: self.usage,
        }
    }

    /// Pull events until the transport closes the channel, then finish.
    ///
    /// `on_event` sees every delta as it arrives, before it is folded. A
    /// transport error aborts the collection.
    pub async fn collect(
        mut receiver: EventStream,
        mut on_event: impl FnMut(&StreamEvent),
    ) -> Result<AssembledResponse, ProviderError> {
        let mut assembler = Self::new();
        while let Some(event) = receiver.recv().await {
            let event = event?;
            on_event(&event);
            assembler.apply(&event);
        }
        Ok(assembler.finish())
    }
}
