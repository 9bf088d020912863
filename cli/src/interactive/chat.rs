//! Plain interactive chat with the weather agent

use super::input::{is_exit_command, Input, LineSource};
use anyhow::Result;
use console::style;
use std::io::Write;
use weather_agent_core::Agent;

/// How a loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The user typed the exit sentinel
    UserExit,
    /// Ctrl-C
    Interrupted,
    /// Input closed
    EndOfInput,
}

fn write_banner(out: &mut impl Write) -> Result<()> {
    writeln!(out, "\n{}\n", style("Weather Forecaster Agent").bold())?;
    writeln!(
        out,
        "This agent uses an HTTP request tool to get weather forecasts"
    )?;
    writeln!(out, "from the National Weather Service API.")?;
    writeln!(out, "\nOptions:")?;
    writeln!(out, "  'exit' - Exit the program")?;
    writeln!(out, "\nOr simply ask about the weather in any US location:")?;
    writeln!(out, "  'What's the weather like in San Francisco?'")?;
    writeln!(out, "  'Will it rain tomorrow in Miami?'")?;
    Ok(())
}

/// Read prompts from `source` until exit, printing each agent response
pub async fn run_chat_loop<S, W>(
    agent: &mut dyn Agent,
    source: &mut S,
    out: &mut W,
) -> Result<LoopExit>
where
    S: LineSource + ?Sized,
    W: Write,
{
    write_banner(out)?;

    loop {
        write!(out, "\n> ")?;
        out.flush()?;

        let line = match source.next_line().await {
            Input::Line(line) => line,
            Input::Interrupted => {
                writeln!(out, "\n\nExecution interrupted. Exiting...")?;
                return Ok(LoopExit::Interrupted);
            }
            Input::Eof => return Ok(LoopExit::EndOfInput),
        };

        if is_exit_command(&line) {
            writeln!(out, "\nGoodbye! 👋")?;
            return Ok(LoopExit::UserExit);
        }

        let result = tokio::select! {
            result = agent.invoke(&line) => result,
            _ = source.wait_for_interrupt() => {
                writeln!(out, "\n\nExecution interrupted. Exiting...")?;
                return Ok(LoopExit::Interrupted);
            }
        };

        match result {
            Ok(response) => {
                let text = response.to_string();
                writeln!(out, "{}", text)?;
                tracing::info!(
                    trace_id = response.trace_id.as_deref().unwrap_or_default(),
                    "{}",
                    text
                );
            }
            Err(e) => {
                tracing::debug!("Agent invocation failed: {}", e);
                writeln!(out, "\nAn error occurred: {}", e)?;
                writeln!(out, "Please try a different request.")?;
            }
        }
    }
}
