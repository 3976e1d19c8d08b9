//! File write tool: create or overwrite files inside the workspace.

use std::path::PathBuf;

use async_trait::async_trait;
use steward_core::error::ToolError;
use steward_core::tool::{Tool, ToolResult};
use steward_security::resolve_in_workspace;
use tracing::debug;

use crate::ToolSettings;
use crate::encoding::{self, TextEncoding};

pub struct RunWriteTool {
    workspace: PathBuf,
}

impl RunWriteTool {
    pub fn new(settings: &ToolSettings) -> Self {
        Self {
            workspace: settings.workspace.clone(),
        }
    }

    async fn write(&self, path: &str, content: &str, encoding: TextEncoding) -> Result<usize, String> {
        let resolved = resolve_in_workspace(&self.workspace, path).map_err(|e| e.to_string())?;
        let bytes = encoding.encode(content)?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }
        tokio::fs::write(&resolved, &bytes)
            .await
            .map_err(|e| e.to_string())?;
        debug!(path = %resolved.display(), bytes = bytes.len(), %encoding, "Wrote file");
        Ok(bytes.len())
    }
}

#[async_trait]
impl Tool for RunWriteTool {
    fn name(&self) -> &str {
        "run_write"
    }

    fn description(&self) -> &str {
        "Write content to a file in the workspace. Creates the file and any missing parent \
         directories, overwrites the file if it exists."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, relative to the workspace"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                },
                "encoding": encoding::schema(
                    "Encoding to write in. Defaults to utf-8; unknown values fall back to it."
                )
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        let encoding = encoding::requested(&arguments).unwrap_or(TextEncoding::Utf8);

        match self.write(path, content, encoding).await {
            Ok(n) if encoding.is_utf8() => Ok(ToolResult::ok(format!("Wrote {n} bytes to {path}"))),
            Ok(n) => Ok(ToolResult::ok(format!(
                "Wrote {n} bytes to {path} (encoding: {encoding})"
            ))),
            Err(e) => Ok(ToolResult::failed(format!("Error: {e}"))),
        }
    }
}
