//! Shared helpers for command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::CliError;

/// Ask the user to confirm a destructive action.
///
/// `--yes` short-circuits to true. In a non-interactive context (stdin is
/// not a terminal) confirmation cannot be given, so the caller gets an
/// error directing them to `--yes`.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool, CliError> {
    if yes {
        return Ok(true);
    }

    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: prompt.to_string(),
        });
    }

    let mut stderr = io::stderr().lock();
    write!(stderr, "{prompt} [y/N] ")?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
