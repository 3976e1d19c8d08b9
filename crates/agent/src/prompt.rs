//! System prompt construction.

use std::path::Path;

use steward_config::IdentityConfig;

/// Build the system prompt for an agent working in `workspace`.
///
/// An override in the identity settings replaces the built-in text; the
/// response language line is appended either way.
pub fn system_prompt(workspace: &Path, identity: &IdentityConfig) -> String {
    let mut prompt = match &identity.system_prompt_override {
        Some(text) => text.trim_end().to_string(),
        None => format!(
            "You are a coding agent at {}.\n\
             \n\
             Loop: plan -> act with tools -> update todos -> report.\n\
             \n\
             Rules:\n\
             - Use run_todo for multi-step tasks\n\
             - Mark tasks in_progress before starting, completed when done\n\
             - Prefer tools over prose. Act, don't just explain.\n\
             - Never invent file paths. Use run_bash with ls/find first if unsure.\n\
             - Make minimal changes. Don't over-engineer.\n\
             - After finishing, summarize what changed.",
            workspace.display()
        ),
    };

    if let Some(language) = identity
        .response_language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
    {
        prompt.push_str(&format!("\n\nRespond in {language}."));
    }

    prompt
}
