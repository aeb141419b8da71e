//! Line console on stdin

use std::fmt;

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Send(String),
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return ConsoleCommand::Empty;
        };
        match (verb.to_ascii_lowercase().as_str(), words.next()) {
            ("send", Some(id)) => ConsoleCommand::Send(id.to_string()),
            ("status", None) => ConsoleCommand::Status,
            ("help" | "?", None) => ConsoleCommand::Help,
            ("quit" | "exit", None) => ConsoleCommand::Quit,
            _ => ConsoleCommand::Unknown(line.trim().to_string()),
        }
    }
}

pub struct Help;

impl fmt::Display for Help {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Commands:")?;
        writeln!(f, "  send <command-id>  execute a configured command")?;
        writeln!(f, "  status             print the latest sensor values")?;
        writeln!(f, "  help               show this text")?;
        write!(f, "  quit               shut down")
    }
}
