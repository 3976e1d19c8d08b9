//! Clock tool: current local time.

use async_trait::async_trait;
use chrono::Local;
use steward_core::error::ToolError;
use steward_core::tool::{Tool, ToolResult};

pub struct GetRealTimeTool;

#[async_trait]
impl Tool for GetRealTimeTool {
    fn name(&self) -> &str {
        "get_real_time"
    }

    fn description(&self) -> &str {
        "Get the current local date and time in ISO-8601 format."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let now = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
        Ok(ToolResult::ok(now.to_string()))
    }
}
