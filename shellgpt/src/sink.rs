//! Terminal rendering of turn events.

use std::io::{self, Stderr, Stdout, Write};

use sgchat::{ChatEvent, TurnSink};

/// Writes answer text to `out` as it streams and status lines to `status`.
#[derive(Debug)]
pub struct TerminalSink<O, E> {
    out: O,
    status: E,
    verbose: bool,
}

pub type StdoutSink = TerminalSink<Stdout, Stderr>;

impl StdoutSink {
    pub fn stdio(verbose: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), verbose)
    }
}

impl<O, E> TerminalSink<O, E>
where
    O: Write + Send,
    E: Write + Send,
{
    pub fn new(out: O, status: E, verbose: bool) -> Self {
        Self {
            out,
            status,
            verbose,
        }
    }

    pub fn into_parts(self) -> (O, E) {
        (self.out, self.status)
    }

    // Terminal write failures are not turn failures.
    fn write_out(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn write_status(&mut self, line: &str) {
        let _ = writeln!(self.status, "{line}");
        let _ = self.status.flush();
    }
}

impl<O, E> TurnSink for TerminalSink<O, E>
where
    O: Write + Send,
    E: Write + Send,
{
    fn emit(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::TextDelta(delta) => self.write_out(&delta),
            ChatEvent::ToolCallsDetected(calls) => {
                if self.verbose {
                    let names = calls
                        .iter()
                        .map(|call| call.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.write_status(&format!("[tool calls: {names}]"));
                }
            }
            ChatEvent::ToolExecuted {
                name,
                query,
                result_count,
            } => {
                let label = if name == "search_address" {
                    "Looking up"
                } else {
                    "Searching for"
                };
                self.write_status(&format!("{label}: {query} ({result_count} results)"));
            }
            ChatEvent::Notice(notice) => self.write_status(&notice),
            ChatEvent::TurnComplete(_) => self.write_out("\n"),
        }
    }
}
