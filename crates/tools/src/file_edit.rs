//! File edit tool: replace one span of text in a workspace file.
//!
//! The file is written back in the encoding it was read in.

use std::path::PathBuf;

use async_trait::async_trait;
use steward_core::error::ToolError;
use steward_core::tool::{Tool, ToolResult};
use steward_security::resolve_in_workspace;

use crate::ToolSettings;
use crate::encoding::TextEncoding;

pub struct RunEditTool {
    workspace: PathBuf,
}

enum EditOutcome {
    Edited(TextEncoding),
    NotFound,
}

impl RunEditTool {
    pub fn new(settings: &ToolSettings) -> Self {
        Self {
            workspace: settings.workspace.clone(),
        }
    }

    async fn edit(
        &self,
        path: &str,
        old_text: &str,
        new_text: &str,
        requested: Option<TextEncoding>,
    ) -> Result<EditOutcome, String> {
        let resolved = resolve_in_workspace(&self.workspace, path).map_err(|e| e.to_string())?;
        let bytes = tokio::fs::read(&resolved).await.map_err(|e| e.to_string())?;

        let (content, encoding) = match requested {
            Some(encoding) => {
                // Writing back a lossy decode would corrupt the file
                let (content, had_errors) = encoding.decode(&bytes);
                if had_errors {
                    return Err(format!("File is not valid {encoding}"));
                }
                (content, encoding)
            }
            None => {
                let encoding = TextEncoding::detect(&bytes);
                (encoding.decode(&bytes).0, encoding)
            }
        };

        if !content.contains(old_text) {
            return Ok(EditOutcome::NotFound);
        }

        let updated = encoding.encode(&content.replacen(old_text, new_text, 1))?;
        tokio::fs::write(&resolved, updated)
            .await
            .map_err(|e| e.to_string())?;
        Ok(EditOutcome::Edited(encoding))
    }
}

#[async_trait]
impl Tool for RunEditTool {
    fn name(&self) -> &str {
        "run_edit"
    }

    fn description(&self) -> &str {
        "Replace the first occurrence of old_text with new_text in a workspace file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path, relative to the workspace"
                },
                "old_text": {
                    "type": "string",
                    "description": "Exact text to find"
                },
                "new_text": {
                    "type": "string",
                    "description": "Replacement text"
                },
                "encoding": crate::encoding::schema(
                    "Encoding to read and write the file in. Detected when omitted."
                )
            },
            "required": ["path", "old_text", "new_text"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let path = arguments["path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'path' argument".into()))?;
        let old_text = arguments["old_text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'old_text' argument".into()))?;
        let new_text = arguments["new_text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'new_text' argument".into()))?;

        if old_text.is_empty() {
            return Err(ToolError::InvalidArguments("'old_text' must not be empty".into()));
        }

        let requested = crate::encoding::requested(&arguments);

        match self.edit(path, old_text, new_text, requested).await {
            Ok(EditOutcome::Edited(encoding)) if encoding.is_utf8() => {
                Ok(ToolResult::ok(format!("Edited {path}")))
            }
            Ok(EditOutcome::Edited(encoding)) => {
                Ok(ToolResult::ok(format!("Edited {path} (encoding: {encoding})")))
            }
            Ok(EditOutcome::NotFound) => {
                Ok(ToolResult::failed(format!("Error: Text not found in {path}")))
            }
            Err(e) => Ok(ToolResult::failed(format!("Error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(dir: &std::path::Path) -> RunEditTool {
        RunEditTool::new(&ToolSettings::new(dir))
    }

    #[tokio::test]
    async fn replaces_first_occurrence_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "foo bar foo").unwrap();

        let result = tool(dir.path())
            .execute(serde_json::json!({"path": "f.txt", "old_text": "foo", "new_text": "baz"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.output, "Edited f.txt");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "baz bar foo"
        );
    }

    #[tokio::test]
    async fn missing_text_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "unchanged").unwrap();

        let result = tool(dir.path())
            .execute(serde_json::json!({"path": "f.txt", "old_text": "nope", "new_text": "x"}))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.output, "Error: Text not found in f.txt");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "unchanged"
        );
    }

    #[tokio::test]
    async fn missing_file_is_reported_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let result = tool(dir.path())
            .execute(serde_json::json!({"path": "ghost.txt", "old_text": "a", "new_text": "b"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error: "));
    }

    #[tokio::test]
    async fn gbk_file_is_written_back_as_gbk() {
        let dir = tempfile::tempdir().unwrap();
        let original = "配置文件：服务器地址在这里填写，端口号默认为八零八零。";
        let (bytes, _, _) = encoding_rs::GBK.encode(original);
        std::fs::write(dir.path().join("conf.txt"), &bytes).unwrap();

        let result = tool(dir.path())
            .execute(serde_json::json!({"path": "conf.txt", "old_text": "八零八零", "new_text": "九零九零"}))
            .await
            .unwrap();

        assert_eq!(result.output, "Edited conf.txt (encoding: gbk)");
        let written = std::fs::read(dir.path().join("conf.txt")).unwrap();
        let (text, _, had_errors) = encoding_rs::GBK.decode(&written);
        assert!(!had_errors);
        assert_eq!(text, original.replace("八零八零", "九零九零"));
    }

    #[tokio::test]
    async fn utf16_bom_survives_edit() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend("name = old".encode_utf16().flat_map(u16::to_le_bytes));
        std::fs::write(dir.path().join("w.ini"), &bytes).unwrap();

        let result = tool(dir.path())
            .execute(serde_json::json!({"path": "w.ini", "old_text": "old", "new_text": "new", "encoding": "utf-16"}))
            .await
            .unwrap();

        assert_eq!(result.output, "Edited w.ini (encoding: utf-16)");
        let mut expected = vec![0xFF, 0xFE];
        expected.extend("name = new".encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(std::fs::read(dir.path().join("w.ini")).unwrap(), expected);
    }

    #[tokio::test]
    async fn mismatched_encoding_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), [b'a', 0xff, b'b']).unwrap();

        let result = tool(dir.path())
            .execute(serde_json::json!({"path": "f.txt", "old_text": "a", "new_text": "c", "encoding": "utf-8"}))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.output, "Error: File is not valid utf-8");
        assert_eq!(std::fs::read(dir.path().join("f.txt")).unwrap(), [b'a', 0xff, b'b']);
    }

    #[tokio::test]
    async fn empty_old_text_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = tool(dir.path())
            .execute(serde_json::json!({"path": "f.txt", "old_text": "", "new_text": "b"}))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }
}
