//! Shell tool: execute system commands inside the workspace.
//!
//! Supports a substring blocklist, an optional base-command allowlist,
//! a timeout, and output truncation.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use steward_core::error::ToolError;
use steward_core::tool::{Tool, ToolResult};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{ToolSettings, truncate_chars};

/// Execute shell commands with safety constraints.
pub struct RunBashTool {
    workspace: PathBuf,
    blocked_patterns: Vec<String>,
    /// If non-empty, only these commands are allowed.
    allowed_commands: Vec<String>,
    timeout: Duration,
    max_output_chars: usize,
}

impl RunBashTool {
    pub fn new(settings: &ToolSettings) -> Self {
        Self {
            workspace: settings.workspace.clone(),
            blocked_patterns: settings.blocked_commands.clone(),
            allowed_commands: settings.allowed_commands.clone(),
            timeout: settings.command_timeout,
            max_output_chars: settings.max_output_chars,
        }
    }

    fn is_blocked(&self, command: &str) -> bool {
        self.blocked_patterns.iter().any(|p| command.contains(p.as_str()))
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true;
        }

        let base_cmd = command.split_whitespace().next().unwrap_or("").trim();
        self.allowed_commands.iter().any(|a| a == base_cmd)
    }
}

#[async_trait]
impl Tool for RunBashTool {
    fn name(&self) -> &str {
        "run_bash"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the workspace and return its combined stdout/stderr. \
         Use it for listing and searching files, running builds and tests, git operations, etc."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;

        if self.is_blocked(command) {
            warn!(command = %command, "Blocked dangerous command");
            return Ok(ToolResult::failed("Error: Dangerous command blocked"));
        }

        if !self.is_command_allowed(command) {
            return Err(ToolError::PermissionDenied {
                tool_name: "run_bash".into(),
                reason: format!(
                    "Command '{}' not in allowlist",
                    command.split_whitespace().next().unwrap_or("")
                ),
            });
        }

        debug!(command = %command, "Executing shell command");

        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.current_dir(&self.workspace).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| ToolError::ExecutionFailed {
                tool_name: "run_bash".into(),
                reason: e.to_string(),
            })?,
            Err(_) => {
                warn!(command = %command, "Command timed out");
                return Ok(ToolResult::failed(format!(
                    "Error: Command timed out ({}s)",
                    self.timeout.as_secs()
                )));
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim();

        let success = output.status.success();
        if !success {
            debug!(command = %command, exit_code = output.status.code().unwrap_or(-1), "Command exited non-zero");
        }

        let text = if combined.is_empty() {
            "(no output)".to_string()
        } else {
            truncate_chars(combined, self.max_output_chars)
        };

        Ok(ToolResult {
            success,
            output: text,
            data: None,
        })
    }
}
