//! `agentflow tools`: list the tool catalog.

use agentflow_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = agentflow_tools::default_registry(&config);

    println!("🧰 Available Tools");
    println!("==================");
    for def in registry.definitions() {
        println!();
        println!("  {}", def.name);
        println!("    {}", def.description);
        println!("    {}", serde_json::to_string(&def.parameters)?);
    }
    println!();
    if !config.sandbox.enabled {
        println!("  Note: execute_javascript is disabled. Set [sandbox] enabled = true to allow it.");
    }
    Ok(())
}
