//! `steward tools`: List the built-in tools and their parameter schemas.

use steward_config::AppConfig;
use steward_tools::new_shared_todo_list;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let settings = super::tool_settings(&config.workspace);
    let registry = steward_tools::default_registry(&settings, new_shared_todo_list());

    println!("Built-in tools ({})", registry.len());
    println!("Workspace: {}", settings.workspace.display());
    println!();

    let mut definitions = registry.definitions();
    definitions.sort_by(|a, b| a.name.cmp(&b.name));
    for definition in definitions {
        println!("  {}", definition.name);
        println!("    {}", definition.description);
        let schema = serde_json::to_string_pretty(&definition.parameters)?;
        for line in schema.lines() {
            println!("      {line}");
        }
        println!();
    }

    Ok(())
}
