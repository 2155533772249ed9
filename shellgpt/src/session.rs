//! The interactive read-eval-print loop.

use std::io::Write;

use anyhow::{Context, Result};
use sgchat::TurnSink;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{ChatRuntime, StdoutSink};

pub const WELCOME: &str = "Welcome to ShellGPT! Type your message or \"quit\" to exit.\n\
Type \"clear\" to clear conversation history, \"history\" to view it, \"help\" for more commands.\n";

pub const HELP: &str = "Available commands:\n  \
clear    - Clear conversation history\n  \
history  - Show conversation history\n  \
help     - Show this help message\n  \
quit     - Exit the chat session\n  \
exit     - Exit the chat session\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Quit,
    Clear,
    History,
    Help,
    Empty,
    Message(String),
}

impl SessionCommand {
    /// Command words are matched case-insensitively; anything else is sent
    /// to the model as typed.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Self::Quit,
            "clear" => Self::Clear,
            "history" => Self::History,
            "help" => Self::Help,
            "" => Self::Empty,
            _ => Self::Message(trimmed.to_string()),
        }
    }
}

/// Runs the loop on `input` until `quit`, end of input, or Ctrl-C.
///
/// The caller owns the stdin reader so lines it has already buffered, such
/// as those after a first-run key prompt, reach the loop.
pub async fn run_interactive<R>(runtime: &mut ChatRuntime, input: R, verbose: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut console = std::io::stdout();
    let mut sink = StdoutSink::stdio(verbose);

    tokio::select! {
        result = run_session(runtime, input, &mut console, &mut sink) => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            println!("\nGoodbye!");
            Ok(())
        }
    }
}

/// The loop itself over any line source. Prompts, command output and turn
/// errors go to `console`; turn events go to `sink`.
pub async fn run_session<R, W>(
    runtime: &mut ChatRuntime,
    input: R,
    console: &mut W,
    sink: &mut dyn TurnSink,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(console, "{WELCOME}")?;

    loop {
        write!(console, "You: ")?;
        console.flush()?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            writeln!(console)?;
            return Ok(());
        };

        match SessionCommand::parse(&line) {
            SessionCommand::Quit => {
                writeln!(console, "Goodbye!")?;
                return Ok(());
            }
            SessionCommand::Clear => {
                runtime.session.clear_history();
                writeln!(console, "Conversation history cleared\n")?;
            }
            SessionCommand::History => {
                let history = runtime.session.render_history();
                if history.is_empty() {
                    writeln!(console, "\nNo conversation history yet.\n")?;
                } else {
                    writeln!(console, "\nConversation history:\n{history}\n")?;
                }
            }
            SessionCommand::Help => writeln!(console, "\n{HELP}")?,
            SessionCommand::Empty => {}
            SessionCommand::Message(message) => {
                writeln!(console, "\nAssistant: ")?;
                console.flush()?;

                runtime.session.refresh_system_prompt();
                if let Err(error) = runtime
                    .service
                    .run_turn(&mut runtime.session, &message, sink)
                    .await
                {
                    tracing::debug!(phase = "session", event = "turn_failed", kind = ?error.kind);
                    writeln!(console, "Error: {}", error.message)?;
                }
                writeln!(console)?;
            }
        }
    }
}
