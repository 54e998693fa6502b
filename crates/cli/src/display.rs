//! Terminal rendering of agent events.

use agentflow_core::display::DisplaySink;
use agentflow_core::message::Role;

/// Prints assistant text and tool activity to the terminal.
///
/// User entries are not echoed; the user just typed them.
#[derive(Debug, Default)]
pub struct TerminalDisplay;

fn prefixed(prefix: &str, text: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl DisplaySink for TerminalDisplay {
    fn on_message(&self, role: Role, text: &str) {
        if role == Role::Assistant {
            println!();
            println!("{}", prefixed("  Assistant > ", text));
            println!();
        }
    }

    fn on_tool_started(&self, name: &str) {
        println!("  🔧 Running {name}...");
    }

    fn on_tool_finished(&self, name: &str, formatted: &str) {
        println!("  ✅ {name} finished");
        println!("{}", prefixed("     ", formatted.trim_end()));
    }

    fn on_tool_failed(&self, name: &str, error: &str) {
        println!("  ❌ {name} failed: {error}");
    }

    fn on_error(&self, message: &str) {
        eprintln!("  [Error] {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_every_line() {
        assert_eq!(prefixed("> ", "a\nb"), "> a\n> b");
        assert_eq!(prefixed("> ", ""), "");
    }
}
