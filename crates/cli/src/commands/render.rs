//! Terminal rendering of agent events.

use std::io::Write;

use steward_agent::AgentStreamEvent;

const BLUE: &str = "\x1b[94m";
const GRAY: &str = "\x1b[90m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

/// Tool output lines shown before the preview is cut.
const PREVIEW_LINES: usize = 6;
const PREVIEW_CHARS: usize = 400;

/// Prints agent events as they arrive.
///
/// Assistant text is written in place so streamed chunks join up; any other
/// line first closes an open text run.
#[derive(Default)]
pub struct Renderer {
    in_text: bool,
    in_thought: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: &AgentStreamEvent) {
        match event {
            AgentStreamEvent::Thought { content } => {
                if !self.in_thought {
                    self.end_line();
                    print!("{GRAY}  (thinking) ");
                    self.in_thought = true;
                }
                print!("{content}");
            }
            AgentStreamEvent::Chunk { content } => {
                if !self.in_text {
                    self.end_line();
                    print!("{BLUE}");
                    self.in_text = true;
                }
                print!("{content}");
            }
            AgentStreamEvent::ToolCall { name, input, .. } => {
                self.end_line();
                println!("{GRAY}  > {}{RESET}", tool_call_line(name, input));
            }
            AgentStreamEvent::ToolResult { output, success, .. } => {
                self.end_line();
                let color = if *success { GRAY } else { RED };
                for line in preview(output).lines() {
                    println!("{color}    {line}{RESET}");
                }
            }
            AgentStreamEvent::Done { .. } => self.end_line(),
            AgentStreamEvent::Error { message } => {
                self.end_line();
                eprintln!("{RED}  [Error] {message}{RESET}");
            }
        }
        let _ = std::io::stdout().flush();
    }

    /// Close an open text or thought run.
    pub fn end_line(&mut self) {
        if self.in_text || self.in_thought {
            println!("{RESET}");
            self.in_text = false;
            self.in_thought = false;
        }
    }
}

/// One-line summary of a tool invocation.
pub fn tool_call_line(name: &str, input: &serde_json::Value) -> String {
    let args = match input.as_object() {
        Some(map) if map.is_empty() => String::new(),
        Some(map) => map
            .iter()
            .map(|(key, value)| match value.as_str() {
                Some(s) => format!("{key}={}", first_line(s)),
                None => format!("{key}={value}"),
            })
            .collect::<Vec<_>>()
            .join(" "),
        None => input.to_string(),
    };
    if args.is_empty() {
        name.to_string()
    } else {
        format!("{name} {args}")
    }
}

fn first_line(s: &str) -> String {
    match s.split_once('\n') {
        Some((head, _)) => format!("{head}..."),
        None => s.to_string(),
    }
}

/// Shortened tool output for display.
pub fn preview(output: &str) -> String {
    let trimmed = output.trim();
    let total = trimmed.lines().count();
    let mut shown: String = trimmed
        .lines()
        .take(PREVIEW_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    if let Some((idx, _)) = shown.char_indices().nth(PREVIEW_CHARS) {
        shown.truncate(idx);
        shown.push_str("...");
    }
    if total > PREVIEW_LINES {
        shown.push_str(&format!("\n... ({} more lines)", total - PREVIEW_LINES));
    }
    shown
}
