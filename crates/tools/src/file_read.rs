//! File read tool: read file contents from inside the workspace.
//!
//! Non-UTF-8 files are decoded in their detected encoding.

use std::path::PathBuf;

use async_trait::async_trait;
use steward_core::error::ToolError;
use steward_core::tool::{Tool, ToolResult};
use steward_security::resolve_in_workspace;
use tracing::debug;

use crate::encoding::{self, TextEncoding};
use crate::{ToolSettings, truncate_chars};

pub struct RunReadTool {
    workspace: PathBuf,
    max_output_chars: usize,
}

impl RunReadTool {
    pub fn new(settings: &ToolSettings) -> Self {
        Self {
            workspace: settings.workspace.clone(),
            max_output_chars: settings.max_output_chars,
        }
    }

    async fn read(
        &self,
        path: &str,
        limit: Option<usize>,
        requested: Option<TextEncoding>,
    ) -> Result<String, String> {
        let resolved = resolve_in_workspace(&self.workspace, path).map_err(|e| e.to_string())?;
        let bytes = tokio::fs::read(&resolved).await.map_err(|e| e.to_string())?;
        let (text, used) = encoding::decode_file(&bytes, requested);
        if !used.is_utf8() {
            debug!(path = %resolved.display(), encoding = %used, "Decoded non-UTF-8 file");
        }

        let total = text.lines().count();
        let text = match limit {
            Some(limit) if limit < total => {
                let mut kept = text.lines().take(limit).collect::<Vec<_>>().join("\n");
                kept.push_str(&format!("\n... ({} more lines)", total - limit));
                kept
            }
            _ => text,
        };

        Ok(truncate_chars(&text, self.max_output_chars))
    }
}

#[async_trait]
impl Tool for RunReadTool {
    fn name(&self) -> &str {
        "run_read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file in the workspace. Optionally limit the number of lines returned."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, relative to the workspace"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of lines to return"
                },
                "encoding": encoding::schema(
                    "File encoding. Defaults to utf-8; detected when the file is not valid in it."
                )
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let limit = arguments["limit"].as_u64().map(|n| n as usize);
        let requested = encoding::requested(&arguments);

        match self.read(path, limit, requested).await {
            Ok(content) => Ok(ToolResult::ok(content)),
            Err(e) => Ok(ToolResult::failed(format!("Error: {e}"))),
        }
    }
}
