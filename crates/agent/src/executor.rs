//! Tool call executor: runs one finalized tool call against the registry.
//!
//! Every failure mode ends up as text for the model, so the turn keeps
//! going. Unparseable argument strings are recovered before execution by
//! [`resolve`].

use std::sync::Arc;

use serde_json::Value;
use steward_core::message::MessageToolCall;
use steward_core::tool::{ToolCall, ToolRegistry, ToolResult};
use tracing::{debug, warn};

/// The name of the task-list tool; calling it counts as a todo update.
pub const TODO_TOOL: &str = "run_todo";

/// What the model gets back for one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub text: String,
    pub success: bool,
    /// The call targeted the task-list tool
    pub todo_touched: bool,
}

pub struct ToolExecutor {
    tools: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Execute a resolved call. Never fails; errors become outcome text.
    pub async fn execute(&self, call: &ToolCall) -> ToolOutcome {
        let todo_touched = call.name == TODO_TOOL;

        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "Model requested an unknown tool");
            return ToolOutcome {
                text: format!("Error: Tool {} not found", call.name),
                success: false,
                todo_touched,
            };
        };

        debug!(tool = %call.name, call_id = %call.id, "Executing tool");

        match tool.execute(call.arguments.clone()).await {
            Ok(result) => ToolOutcome {
                success: result.success,
                text: result_text(result),
                todo_touched,
            },
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolOutcome {
                    text: format!("Error executing {}: {e}", call.name),
                    success: false,
                    todo_touched,
                }
            }
        }
    }
}

/// Decode a call's raw argument string.
pub fn resolve(call: &MessageToolCall) -> ToolCall {
    ToolCall {
        id: call.id.clone(),
        name: call.name.clone(),
        arguments: parse_arguments(&call.name, &call.arguments),
    }
}

/// Decode the model's argument string into a JSON object.
///
/// Blank input means no arguments. Invalid JSON or a non-object value is
/// replaced by an empty object.
pub fn parse_arguments(tool: &str, raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Default::default());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            warn!(tool, arguments = %other, "Tool arguments are not a JSON object, using {{}}");
            Value::Object(Default::default())
        }
        Err(e) => {
            warn!(tool, arguments = %raw, error = %e, "Failed to parse tool arguments, using {{}}");
            Value::Object(Default::default())
        }
    }
}

fn result_text(result: ToolResult) -> String {
    match result.data {
        Some(data) if result.output.is_empty() => data.to_string(),
        _ => result.output,
    }
}
