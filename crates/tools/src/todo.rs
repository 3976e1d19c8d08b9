//! Todo tool: a structured task list the model keeps while it works.
//!
//! The list lives in a [`TodoManager`] owned by the session and shared
//! with the [`TodoTool`] through a [`SharedTodoList`] handle. Every update
//! replaces the whole list; a rejected update leaves it untouched.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use steward_core::error::ToolError;
use steward_core::tool::{Tool, ToolResult};
use tokio::sync::Mutex;
use tracing::debug;

/// Upper bound on the number of tracked items.
pub const MAX_TODOS: usize = 20;

/// Handle shared between a session and its `run_todo` tool.
pub type SharedTodoList = Arc<Mutex<TodoManager>>;

pub fn new_shared_todo_list() -> SharedTodoList {
    Arc::new(Mutex::new(TodoManager::new()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for TodoStatus {
    type Err = ();

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub content: String,
    pub status: TodoStatus,
    #[serde(rename = "activeForm")]
    pub active_form: String,
}

/// An item as the model sent it, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoDraft {
    pub content: String,
    /// `None` means the field was absent and defaults to pending.
    pub status: Option<String>,
    pub active_form: String,
}

impl TodoDraft {
    pub fn new(
        content: impl Into<String>,
        status: impl Into<String>,
        active_form: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            status: Some(status.into()),
            active_form: active_form.into(),
        }
    }

    /// Read a draft out of loosely-typed JSON. Numbers and booleans are
    /// stringified; missing or null fields become empty.
    pub fn from_value(value: &Value) -> Self {
        Self {
            content: lenient_str(value.get("content")).unwrap_or_default(),
            status: lenient_str(value.get("status")),
            active_form: lenient_str(value.get("activeForm")).unwrap_or_default(),
        }
    }
}

fn lenient_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TodoError {
    #[error("Item {index}: content required")]
    ContentRequired { index: usize },

    #[error("Item {index}: invalid status '{status}'")]
    InvalidStatus { index: usize, status: String },

    #[error("Item {index}: activeForm required")]
    ActiveFormRequired { index: usize },

    #[error("Max {} todos allowed", MAX_TODOS)]
    TooMany,

    #[error("Only one task can be in_progress at a time")]
    MultipleInProgress,
}

/// Holds the current task list. Item positions in error messages are
/// zero-based.
#[derive(Debug, Default)]
pub struct TodoManager {
    items: Vec<TodoItem>,
}

impl TodoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and replace the whole list, returning the rendered view.
    pub fn update(&mut self, drafts: Vec<TodoDraft>) -> Result<String, TodoError> {
        let mut validated = Vec::with_capacity(drafts.len());
        let mut in_progress = 0;

        for (index, draft) in drafts.into_iter().enumerate() {
            let content = draft.content.trim();
            if content.is_empty() {
                return Err(TodoError::ContentRequired { index });
            }

            let raw_status = draft.status.as_deref().unwrap_or("pending");
            let status = raw_status
                .parse::<TodoStatus>()
                .map_err(|()| TodoError::InvalidStatus {
                    index,
                    status: raw_status.trim().to_lowercase(),
                })?;

            let active_form = draft.active_form.trim();
            if active_form.is_empty() {
                return Err(TodoError::ActiveFormRequired { index });
            }

            if status == TodoStatus::InProgress {
                in_progress += 1;
            }
            validated.push(TodoItem {
                content: content.to_string(),
                status,
                active_form: active_form.to_string(),
            });
        }

        if validated.len() > MAX_TODOS {
            return Err(TodoError::TooMany);
        }
        if in_progress > 1 {
            return Err(TodoError::MultipleInProgress);
        }

        debug!(count = validated.len(), "Todo list updated");
        self.items = validated;
        Ok(self.render())
    }

    /// Human-readable view of the list.
    pub fn render(&self) -> String {
        if self.items.is_empty() {
            return "No todos.".to_string();
        }

        let lines: Vec<String> = self
            .items
            .iter()
            .map(|item| match item.status {
                TodoStatus::Completed => format!("[x] {}", item.content),
                TodoStatus::InProgress => format!("[>] {} <- {}", item.content, item.active_form),
                TodoStatus::Pending => format!("[ ] {}", item.content),
            })
            .collect();

        let done = self
            .items
            .iter()
            .filter(|item| item.status == TodoStatus::Completed)
            .count();

        format!(
            "{}\n\n({}/{} completed)",
            lines.join("\n"),
            done,
            self.items.len()
        )
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// `run_todo`: replace the session's task list.
pub struct TodoTool {
    todos: SharedTodoList,
}

impl TodoTool {
    pub fn new(todos: SharedTodoList) -> Self {
        Self { todos }
    }
}

#[async_trait]
impl Tool for TodoTool {
    fn name(&self) -> &str {
        "run_todo"
    }

    fn description(&self) -> &str {
        "Update the task list. Send the complete list every time. Use it to plan multi-step \
         work and to track progress: exactly one task may be in_progress at a time."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "description": "The complete task list",
                    "items": {
                        "type": "object",
                        "properties": {
                            "content": {
                                "type": "string",
                                "description": "What needs to be done"
                            },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "in_progress", "completed"]
                            },
                            "activeForm": {
                                "type": "string",
                                "description": "Present-continuous form shown while the task runs, e.g. 'Running tests'"
                            }
                        },
                        "required": ["content", "status", "activeForm"]
                    }
                }
            },
            "required": ["items"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let items = arguments["items"]
            .as_array()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'items' array".into()))?;
        let drafts = items.iter().map(TodoDraft::from_value).collect();

        let mut todos = self.todos.lock().await;
        match todos.update(drafts) {
            Ok(rendered) => Ok(ToolResult::ok(format!("\n{rendered}"))),
            Err(e) => Ok(ToolResult::failed(format!("Error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(content: &str, status: &str) -> TodoDraft {
        TodoDraft::new(content, status, format!("Doing {content}"))
    }

    #[test]
    fn empty_list_renders_placeholder() {
        assert_eq!(TodoManager::new().render(), "No todos.");
    }

    #[test]
    fn single_in_progress_item() {
        let mut manager = TodoManager::new();
        let rendered = manager.update(vec![draft("A", "in_progress")]).unwrap();
        assert_eq!(rendered, "[>] A <- Doing A\n\n(0/1 completed)");
    }

    #[test]
    fn mixed_statuses_render_in_order() {
        let mut manager = TodoManager::new();
        let rendered = manager
            .update(vec![
                draft("Read code", "completed"),
                draft("Fix bug", "in_progress"),
                draft("Write tests", "pending"),
            ])
            .unwrap();
        assert_eq!(
            rendered,
            "[x] Read code\n[>] Fix bug <- Doing Fix bug\n[ ] Write tests\n\n(1/3 completed)"
        );
    }

    #[test]
    fn too_many_items_rejected_and_list_unchanged() {
        let mut manager = TodoManager::new();
        manager.update(vec![draft("keep", "pending")]).unwrap();
        let before = manager.items().to_vec();

        let drafts = (0..21).map(|i| draft(&format!("t{i}"), "pending")).collect();
        let err = manager.update(drafts).unwrap_err();

        assert_eq!(err, TodoError::TooMany);
        assert_eq!(err.to_string(), "Max 20 todos allowed");
        assert_eq!(manager.items(), before.as_slice());
    }

    #[test]
    fn twenty_items_accepted() {
        let mut manager = TodoManager::new();
        let drafts = (0..20).map(|i| draft(&format!("t{i}"), "pending")).collect();
        assert!(manager.update(drafts).is_ok());
        assert_eq!(manager.items().len(), 20);
    }

    #[test]
    fn two_in_progress_rejected_and_list_unchanged() {
        let mut manager = TodoManager::new();
        manager.update(vec![draft("keep", "completed")]).unwrap();
        let before = manager.items().to_vec();

        let err = manager
            .update(vec![draft("a", "in_progress"), draft("b", "in_progress")])
            .unwrap_err();

        assert_eq!(err.to_string(), "Only one task can be in_progress at a time");
        assert_eq!(manager.items(), before.as_slice());
    }

    #[test]
    fn per_item_validation_messages() {
        let mut manager = TodoManager::new();

        let err = manager
            .update(vec![draft("ok", "pending"), TodoDraft::new("  ", "pending", "x")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Item 1: content required");

        let err = manager.update(vec![draft("a", "Blocked")]).unwrap_err();
        assert_eq!(err.to_string(), "Item 0: invalid status 'blocked'");

        let err = manager
            .update(vec![TodoDraft::new("a", "pending", "")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Item 0: activeForm required");
    }

    #[test]
    fn status_is_case_insensitive_and_defaults_to_pending() {
        let mut manager = TodoManager::new();
        manager
            .update(vec![
                draft("a", " COMPLETED "),
                TodoDraft {
                    content: "b".into(),
                    status: None,
                    active_form: "Doing b".into(),
                },
            ])
            .unwrap();
        assert_eq!(manager.items()[0].status, TodoStatus::Completed);
        assert_eq!(manager.items()[1].status, TodoStatus::Pending);
    }

    #[test]
    fn fields_are_trimmed() {
        let mut manager = TodoManager::new();
        manager
            .update(vec![TodoDraft::new("  tidy  ", "pending", " Tidying ")])
            .unwrap();
        assert_eq!(manager.items()[0].content, "tidy");
        assert_eq!(manager.items()[0].active_form, "Tidying");
    }

    #[test]
    fn draft_from_loose_json() {
        let d = TodoDraft::from_value(&serde_json::json!({"content": 42, "activeForm": null}));
        assert_eq!(d.content, "42");
        assert_eq!(d.status, None);
        assert_eq!(d.active_form, "");
    }

    #[test]
    fn item_serializes_active_form_in_camel_case() {
        let item = TodoItem {
            content: "a".into(),
            status: TodoStatus::InProgress,
            active_form: "Doing a".into(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["activeForm"], "Doing a");
        assert_eq!(json["status"], "in_progress");
    }

    #[tokio::test]
    async fn tool_updates_shared_list() {
        let todos = new_shared_todo_list();
        let tool = TodoTool::new(todos.clone());

        let result = tool
            .execute(serde_json::json!({
                "items": [{"content": "A", "status": "in_progress", "activeForm": "Doing A"}]
            }))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.output, "\n[>] A <- Doing A\n\n(0/1 completed)");
        assert_eq!(todos.lock().await.items().len(), 1);
    }

    #[tokio::test]
    async fn tool_reports_validation_error_as_text() {
        let tool = TodoTool::new(new_shared_todo_list());
        let result = tool
            .execute(serde_json::json!({
                "items": [{"content": "", "status": "pending", "activeForm": "x"}]
            }))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.output, "Error: Item 0: content required");
    }

    #[tokio::test]
    async fn tool_requires_items_array() {
        let tool = TodoTool::new(new_shared_todo_list());
        let result = tool.execute(serde_json::json!({"items": "nope"})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
