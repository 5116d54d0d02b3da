//! Interactive prompting behind a trait, so selection logic can run against fakes.

use crate::error::{Error, Result};
use std::io::{self, BufRead, IsTerminal, Write};

/// One selectable entry: the value returned on selection plus a display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub key: String,
    pub label: String,
}

/// Asks a question over a list of choices and returns the raw answer text.
///
/// Implementations do not validate the answer; normalization happens in
/// `select::select`.
pub trait Prompter {
    fn ask(&self, question: &str, choices: &[Choice]) -> Result<String>;
}

/// Prompter reading from stdin and drawing on stderr.
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    /// Create with automatic TTY detection. Stdout is free to be piped.
    pub fn new() -> Self {
        Self {
            interactive: can_prompt(&io::stdin(), &io::stderr()),
        }
    }

    /// Create with explicit interactive mode.
    pub fn with_interactive(interactive: bool) -> Self {
        Self { interactive }
    }
}

/// Prompting needs a terminal to read answers from and one to draw choices on.
fn can_prompt(input: &impl IsTerminal, display: &impl IsTerminal) -> bool {
    input.is_terminal() && display.is_terminal()
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&self, question: &str, choices: &[Choice]) -> Result<String> {
        if !self.interactive {
            return Err(Error::validation_invalid_argument(
                "tty",
                "Ref selection requires an interactive TTY",
                None,
                None,
            )
            .with_hint("Pass --branch <name> or --tag <name> to skip the prompt"));
        }

        let width = choices.iter().map(|c| c.key.len()).max().unwrap_or(0);

        eprintln!("{}", question);
        for (i, choice) in choices.iter().enumerate() {
            eprintln!(
                "  [{}] {:width$}  {}",
                i + 1,
                choice.key,
                choice.label,
                width = width
            );
        }
        eprint!("> ");
        io::stderr().flush().ok();

        let mut input = String::new();
        io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|e| Error::internal_io(e.to_string(), Some("read answer".to_string())))?;

        Ok(input.trim().to_string())
    }
}
