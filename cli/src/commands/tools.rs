//! Tools listing command

use anyhow::Result;
use console::style;
use tracing::info;
use weather_agent_core::tools::ToolRegistry;

/// Show available tools
pub async fn tools_command() -> Result<()> {
    info!("Listing available tools");

    println!("🛠️  Available Tools\n");

    let registry = ToolRegistry::default();
    for name in registry.list_tools() {
        if let Some((tool_name, description)) = registry.get_tool_info(name) {
            println!("📦 {}", style(tool_name).bold());
            // First line only
            let first_line = description.lines().next().unwrap_or(description);
            println!("   {}\n", first_line);
        }
    }

    Ok(())
}
