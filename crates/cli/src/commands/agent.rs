//! `steward agent`: Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;

use steward_agent::{AgentLoop, AgentStreamEvent, Session, TurnOutcome, system_prompt};
use steward_config::{AppConfig, platform_key_var};
use steward_core::Error;
use steward_core::error::ProviderError;
use steward_tools::new_shared_todo_list;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::render::Renderer;

pub async fn run(
    message: Option<String>,
    streaming: Option<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Fail early with setup instructions
    if !config.has_api_key() {
        print_key_help(&config);
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = steward_providers::build_from_config(&config);
    let provider = router
        .default()
        .ok_or_else(|| ProviderError::NotConfigured(config.default_provider.clone()))?;
    let model = steward_providers::resolve_model(&config);

    let settings = super::tool_settings(&config.workspace);
    let workspace = settings.workspace.clone();
    let todos = new_shared_todo_list();
    let tools = Arc::new(steward_tools::default_registry(&settings, todos.clone()));

    let streaming = streaming.unwrap_or(config.agent.stream);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let agent = AgentLoop::new(provider, &model, config.temperature, tools)
        .with_max_tokens(config.max_tokens)
        .with_max_rounds(config.agent.max_rounds)
        .with_streaming(streaming)
        .with_todo_reminder_after(config.agent.todo_reminder_after)
        .with_events(events_tx);

    let mut session = Session::new(system_prompt(&workspace, &config.identity), todos);
    let mut renderer = Renderer::new();

    if let Some(msg) = message {
        // Single message mode
        run_turn(&agent, &mut session, &msg, &mut events_rx, &mut renderer).await?;
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Steward: Interactive Mode");
    println!();
    println!("  Provider:  {}", agent.provider_name());
    println!("  Model:     {}", agent.model());
    println!("  Workspace: {}", workspace.display());
    println!("  Streaming: {}", if streaming { "on" } else { "off" });
    println!("  Tools:     {}", agent.tools().names().join(", "));
    println!();
    println!("  /todos shows the task list, /reset starts over.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match ReplCommand::parse(input) {
            ReplCommand::Empty => continue,
            ReplCommand::Exit => break,
            ReplCommand::Todos => {
                println!("{}", session.todos.lock().await.render());
                println!();
                continue;
            }
            ReplCommand::Reset => {
                session.reset().await;
                println!("  Conversation cleared.");
                println!();
                continue;
            }
            ReplCommand::Message => {}
        }

        println!();
        // The error line is already rendered from the event stream
        if let Err(e) = run_turn(&agent, &mut session, input, &mut events_rx, &mut renderer).await {
            tracing::debug!("Turn failed: {e}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

/// What a line typed at the interactive prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Empty,
    Exit,
    Todos,
    Reset,
    Message,
}

impl ReplCommand {
    /// Classify an already-trimmed input line. Keywords match in any case.
    fn parse(input: &str) -> Self {
        if input.is_empty() {
            return Self::Empty;
        }
        let is = |keyword: &str| input.eq_ignore_ascii_case(keyword);
        if is("exit") || is("quit") {
            Self::Exit
        } else if is("/todos") {
            Self::Todos
        } else if is("/reset") {
            Self::Reset
        } else {
            Self::Message
        }
    }
}

/// Run one turn, rendering its events while it is in flight.
async fn run_turn(
    agent: &AgentLoop,
    session: &mut Session,
    input: &str,
    events: &mut mpsc::UnboundedReceiver<AgentStreamEvent>,
    renderer: &mut Renderer,
) -> Result<TurnOutcome, Error> {
    let turn = agent.respond(session, input);
    tokio::pin!(turn);

    let result = loop {
        tokio::select! {
            result = &mut turn => break result,
            Some(event) = events.recv() => renderer.handle(&event),
        }
    };

    // Events sent right before the turn finished
    while let Ok(event) = events.try_recv() {
        renderer.handle(&event);
    }
    renderer.end_line();
    result
}

fn print_key_help(config: &AppConfig) {
    eprintln!();
    eprintln!("  ERROR: No API key configured for '{}'!", config.default_provider);
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    STEWARD_API_KEY=...        (generic)");
    if let Some(var) = platform_key_var(&config.default_provider) {
        eprintln!("    {var}=...   (platform key)");
    }
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    eprintln!("  To use a local LM Studio server instead: STEWARD_PROVIDER=local");
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_keywords_ignore_case() {
        for input in ["exit", "EXIT", "Exit", "quit", "QUIT", "Quit"] {
            assert_eq!(ReplCommand::parse(input), ReplCommand::Exit, "{input}");
        }
    }

    #[test]
    fn slash_commands_ignore_case() {
        assert_eq!(ReplCommand::parse("/todos"), ReplCommand::Todos);
        assert_eq!(ReplCommand::parse("/TODOS"), ReplCommand::Todos);
        assert_eq!(ReplCommand::parse("/Reset"), ReplCommand::Reset);
    }

    #[test]
    fn other_input_is_a_message() {
        assert_eq!(ReplCommand::parse(""), ReplCommand::Empty);
        assert_eq!(ReplCommand::parse("exit now"), ReplCommand::Message);
        assert_eq!(ReplCommand::parse("list the files"), ReplCommand::Message);
    }
}
