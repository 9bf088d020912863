//! Line input for the interactive loops
//!
//! Loops read through [`LineSource`] so they can be driven by stdin in the
//! binary and by scripted input in tests.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Sentinel that ends a loop
pub const EXIT_COMMAND: &str = "exit";

/// One read from the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A line without its terminator
    Line(String),
    /// Ctrl-C while waiting for input
    Interrupted,
    /// End of input
    Eof,
}

/// Source of user input lines
#[async_trait]
pub trait LineSource: Send {
    /// Wait for the next line
    async fn next_line(&mut self) -> Input;

    /// Resolve when the user interrupts a running request
    async fn wait_for_interrupt(&mut self) {
        std::future::pending::<()>().await
    }
}

/// Reads lines from stdin and treats Ctrl-C as an interrupt
pub struct StdinLineSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinLineSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinLineSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineSource for StdinLineSource {
    async fn next_line(&mut self) -> Input {
        tokio::select! {
            line = self.lines.next_line() => match line {
                Ok(Some(line)) => Input::Line(line),
                Ok(None) => Input::Eof,
                Err(e) => {
                    tracing::warn!("Failed to read input: {}", e);
                    Input::Eof
                }
            },
            _ = ctrl_c() => Input::Interrupted,
        }
    }

    async fn wait_for_interrupt(&mut self) {
        ctrl_c().await
    }
}

/// Ctrl-C, or never if the signal handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await
    }
}

/// Whether `input` is the exit sentinel; case-insensitive, not trimmed
pub fn is_exit_command(input: &str) -> bool {
    input.to_lowercase() == EXIT_COMMAND
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    /// Replays scripted input, then reports end of input
    pub struct ScriptedLineSource {
        inputs: VecDeque<Input>,
        interrupt_requests: bool,
    }

    impl ScriptedLineSource {
        pub fn new(inputs: Vec<Input>) -> Self {
            Self {
                inputs: inputs.into(),
                interrupt_requests: false,
            }
        }

        pub fn lines(lines: &[&str]) -> Self {
            Self::new(lines.iter().map(|l| Input::Line(l.to_string())).collect())
        }

        /// Interrupt every request as soon as it starts
        pub fn interrupting(mut self) -> Self {
            self.interrupt_requests = true;
            self
        }
    }

    #[async_trait]
    impl LineSource for ScriptedLineSource {
        async fn next_line(&mut self) -> Input {
            self.inputs.pop_front().unwrap_or(Input::Eof)
        }

        async fn wait_for_interrupt(&mut self) {
            if !self.interrupt_requests {
                std::future::pending::<()>().await
            }
        }
    }
}
