//! Operator interaction: choosing a pipeline and answering approval prompts.
//!
//! Prompts block until the operator answers. There is no timeout; an
//! interrupt from the host is the only way out of a pending prompt.

use std::io::{BufRead, Write};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("operator input closed")]
    InputClosed,

    #[error("no pipelines to choose from")]
    NothingToSelect,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability to ask the human running the monitor for input.
#[async_trait::async_trait]
pub trait Operator: Send + Sync {
    /// Pick one pipeline out of `names`.
    async fn select_pipeline(&self, names: &[String]) -> Result<String, OperatorError>;

    /// Yes/no question; an empty answer takes `default`.
    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool, OperatorError>;

    /// Free-text answer, trimmed.
    async fn read_text(&self, prompt: &str) -> Result<String, OperatorError>;
}

/// Operator on the process's own terminal (stdin/stdout).
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalOperator;

impl TerminalOperator {
    /// Print `prompt` and read one line on a blocking thread.
    async fn ask(prompt: String) -> Result<String, OperatorError> {
        tokio::task::spawn_blocking(move || -> Result<String, OperatorError> {
            let mut stdout = std::io::stdout().lock();
            // Show the cursor again; the presenter hides it while redrawing.
            write!(stdout, "\x1b[?25h{prompt}")?;
            stdout.flush()?;
            drop(stdout);

            let mut line = String::new();
            let read = std::io::stdin().lock().read_line(&mut line)?;
            if read == 0 {
                return Err(OperatorError::InputClosed);
            }
            Ok(line.trim().to_string())
        })
        .await
        .map_err(|e| OperatorError::Io(std::io::Error::other(e)))?
    }
}

#[async_trait::async_trait]
impl Operator for TerminalOperator {
    async fn select_pipeline(&self, names: &[String]) -> Result<String, OperatorError> {
        if names.is_empty() {
            return Err(OperatorError::NothingToSelect);
        }
        let mut menu = String::from("Choose a pipeline:\n");
        for (i, name) in names.iter().enumerate() {
            menu.push_str(&format!("  {:>3}) {}\n", i + 1, name));
        }
        menu.push_str("> ");

        loop {
            let answer = Self::ask(menu.clone()).await?;
            if let Some(choice) = parse_selection(&answer, names) {
                return Ok(choice.to_string());
            }
            println!("'{answer}' is not a pipeline number or name.");
        }
    }

    async fn confirm(&self, prompt: &str, default: bool) -> Result<bool, OperatorError> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = Self::ask(format!("{prompt} {hint} ")).await?;
            if let Some(value) = parse_yes_no(&answer, default) {
                return Ok(value);
            }
            println!("Please answer y or n.");
        }
    }

    async fn read_text(&self, prompt: &str) -> Result<String, OperatorError> {
        Self::ask(format!("{prompt}: ")).await
    }
}

/// Accept a 1-based index or an exact pipeline name.
fn parse_selection<'a>(answer: &str, names: &'a [String]) -> Option<&'a str> {
    if let Ok(n) = answer.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| names.get(i)).map(String::as_str);
    }
    names.iter().find(|n| n.as_str() == answer).map(String::as_str)
}

fn parse_yes_no(answer: &str, default: bool) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
