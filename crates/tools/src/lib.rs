//! Built-in tool implementations for Steward.
//!
//! Tools give the agent the ability to work inside a project directory:
//! run shell commands, read, write and edit files, check the clock, and
//! keep a structured todo list.
//!
//! Every file path a tool receives is confined to the workspace root.

pub mod clock;
pub mod encoding;
pub mod file_edit;
pub mod file_read;
pub mod file_write;
pub mod shell;
pub mod todo;

use std::path::PathBuf;
use std::time::Duration;

use steward_core::tool::ToolRegistry;

pub use encoding::TextEncoding;
pub use todo::{SharedTodoList, TodoDraft, TodoError, TodoItem, TodoManager, TodoStatus, new_shared_todo_list};

/// Settings shared by the built-in tools.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Directory all file paths and shell commands are anchored to
    pub workspace: PathBuf,
    /// Substrings that get a shell command rejected
    pub blocked_commands: Vec<String>,
    /// If non-empty, only these base commands may run
    pub allowed_commands: Vec<String>,
    /// Shell command timeout
    pub command_timeout: Duration,
    /// Output truncation limit, in characters
    pub max_output_chars: usize,
}

impl ToolSettings {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            blocked_commands: vec![
                "rm -rf /".into(),
                "sudo".into(),
                "shutdown".into(),
                "reboot".into(),
                "> /dev/".into(),
            ],
            allowed_commands: Vec::new(),
            command_timeout: Duration::from_secs(60),
            max_output_chars: 50_000,
        }
    }
}

/// Create a registry with all built-in tools.
///
/// The todo list handle is shared with the caller so the session that owns
/// it can render it without going through the model.
pub fn default_registry(settings: &ToolSettings, todos: SharedTodoList) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(shell::RunBashTool::new(settings)));
    registry.register(Box::new(file_read::RunReadTool::new(settings)));
    registry.register(Box::new(file_write::RunWriteTool::new(settings)));
    registry.register(Box::new(file_edit::RunEditTool::new(settings)));
    registry.register(Box::new(clock::GetRealTimeTool));
    registry.register(Box::new(todo::TodoTool::new(todos)));
    registry
}

/// Cut `text` to at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_all_builtin_tools() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(&ToolSettings::new(dir.path()), new_shared_todo_list());
        assert_eq!(
            registry.names(),
            vec!["get_real_time", "run_bash", "run_edit", "run_read", "run_todo", "run_write"]
        );
    }

    #[test]
    fn todo_schema_is_nested_array() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(&ToolSettings::new(dir.path()), new_shared_todo_list());
        let def = registry
            .definitions()
            .into_iter()
            .find(|d| d.name == "run_todo")
            .unwrap();
        let items = &def.parameters["properties"]["items"];
        assert_eq!(items["type"], "array");
        assert_eq!(items["items"]["type"], "object");
        assert!(items["items"]["properties"]["activeForm"].is_object());
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 0), "");
    }
}
