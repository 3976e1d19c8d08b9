pub mod agent;
pub mod config_cmd;
pub mod render;
pub mod tools;

use std::time::Duration;

use steward_config::WorkspaceConfig;
use steward_tools::ToolSettings;

/// Tool settings for the configured workspace.
pub fn tool_settings(workspace: &WorkspaceConfig) -> ToolSettings {
    ToolSettings {
        workspace: workspace.resolved_root(),
        blocked_commands: workspace.blocked_commands.clone(),
        allowed_commands: workspace.allowed_commands.clone(),
        command_timeout: Duration::from_secs(workspace.command_timeout_secs),
        max_output_chars: workspace.max_output_chars,
    }
}
