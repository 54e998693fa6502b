//! `agentflow chat`: interactive or single-message chat.

use std::io::Write;
use std::sync::Arc;

use agentflow_agent::{Agent, TurnError, TurnOutcome};
use agentflow_config::AppConfig;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::display::TerminalDisplay;

const EXIT_WORDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// The text to print for a single-message turn. Hitting the round cap is
/// an error so the process exits non-zero.
fn single_answer(outcome: TurnOutcome, max_rounds: usize) -> Result<Option<String>, String> {
    match outcome {
        TurnOutcome::Answered(answer) => Ok(answer),
        TurnOutcome::RoundLimitReached => Err(format!(
            "Stopped after {max_rounds} tool rounds without a final answer."
        )),
    }
}

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(msg) = message {
        // Single message mode: no greeting, just the answer
        let agent = Agent::from_config(&config, Arc::new(agentflow_core::NullDisplay));
        let outcome = agent.submit(&msg).await?;
        if let Some(answer) = single_answer(outcome, config.agent.max_tool_rounds)? {
            println!("{answer}");
        }
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        AgentFlow: Interactive Mode           ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    if config.has_api_key() {
        println!("  Provider:  {}", config.provider);
        println!("  Model:     {}", config.effective_model());
    } else {
        println!("  Provider:  offline simulator (no API key configured)");
    }
    println!(
        "  Sandbox:   {}",
        if config.sandbox.enabled { "enabled" } else { "disabled" }
    );
    println!();
    println!("  Type your message and press Enter.");
    println!("  '/clear' starts over, 'exit' or Ctrl+D quits.");

    let agent = Agent::from_config(&config, Arc::new(TerminalDisplay));
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF (Ctrl+D)
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&line) {
            break;
        }
        if line == "/clear" {
            agent.clear()?;
            continue;
        }

        match agent.submit(line).await {
            // Provider failures were already shown through the display
            Ok(_) | Err(TurnError::EmptyInput) | Err(TurnError::Provider(_)) => {}
            Err(e) => eprintln!("  [Error] {e}"),
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}
