//! Command execution primitives with consistent error handling.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Output};

use crate::error::{Error, Result};

/// Spawn a command and capture its output without judging the exit status.
///
/// The raw `io::Error` is returned so callers can tell a missing executable
/// (`ErrorKind::NotFound`) apart from other spawn failures.
pub fn capture(program: &str, args: &[&str], dir: Option<&Path>) -> io::Result<Output> {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = dir {
        command.current_dir(dir);
    }
    command.output()
}

/// `capture` with extra environment variables set on the child.
pub fn capture_with_env(
    program: &str,
    args: &[&str],
    env: &[(&str, &str)],
) -> io::Result<Output> {
    let mut command = Command::new(program);
    command.args(args);
    for (key, value) in env {
        command.env(key, value);
    }
    command.output()
}

/// Run a command, returning None on failure or empty output instead of an error.
///
/// Useful when command failure is expected/acceptable (e.g., an unset git config key).
pub fn run_optional(program: &str, args: &[&str], dir: Option<&Path>) -> Option<String> {
    let output = capture(program, args, dir).ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = stdout_text(&output);
    if stdout.is_empty() {
        None
    } else {
        Some(stdout)
    }
}

/// Run a command with inherited stdio and extra environment variables.
///
/// Used for the external deploy runner, whose output belongs to the user.
pub fn run_inherited(argv: &[String], env: &[(&str, &str)]) -> Result<ExitStatus> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::validation_missing_argument(vec!["command".to_string()]))?;

    let mut command = Command::new(program);
    command.args(args);
    for (key, value) in env {
        command.env(key, value);
    }

    command.status().map_err(|e| {
        Error::internal_io(
            format!("Failed to run {}: {}", program, e),
            Some(argv.join(" ")),
        )
    })
}

/// Trimmed stdout as a lossy UTF-8 string.
pub fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Extract error text from command output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}
