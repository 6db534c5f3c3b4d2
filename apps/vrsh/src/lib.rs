// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Interactive operator console for a remote VR process controller.
//!
//! The shell forwards each command line to the controller over a line-oriented
//! transport and prints the single response line. Tab completion is driven by
//! the read-only command tree built in `vrsh-core`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{debug, warn};
use vrsh_core::{CommandLine, CompletionTree, Resolution};

pub mod config;
pub mod editor;
pub mod transport;

pub use config::{load_config, ConsoleConfig, DEFAULT_PROMPT};
pub use editor::{ConsoleHelper, EditorReader};
pub use transport::tcp::TcpTransport;
pub use transport::{ConnectionError, ConnectionState, Transport, VRSH_CONTROLLER_PORT};

/// Verbs handled by the console without contacting the controller.
pub const LOCAL_COMMANDS: [&str; 3] = ["help", "quit", "exit"];

/// Result of executing a single shell command.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandStatus {
    /// Continue reading commands.
    Continue,
    /// Exit the shell loop.
    Quit,
}

/// Lifecycle of the command loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShellState {
    /// Reading and dispatching commands.
    Running,
    /// The loop has ended; no further commands are read.
    Terminated,
}

/// Source of command lines for the interactive loop.
pub trait LineReader {
    /// Read one line, returning `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Return true when the reader prints the prompt itself.
    fn renders_prompt(&self) -> bool {
        false
    }
}

/// Line reader over any buffered input, used for piped stdin and tests.
#[derive(Debug)]
pub struct PlainReader<R: BufRead> {
    inner: R,
}

impl<R: BufRead> PlainReader<R> {
    /// Wrap a buffered reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: BufRead> LineReader for PlainReader<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(read_lossy_line(&mut self.inner)?)
    }
}

/// Read one line, replacing invalid UTF-8 instead of failing the whole loop.
fn read_lossy_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Shell driver responsible for parsing commands and invoking the transport.
pub struct Shell<T: Transport, W: Write> {
    transport: T,
    tree: Arc<CompletionTree>,
    writer: W,
    prompt: String,
    state: ShellState,
}

impl<T: Transport, W: Write> Shell<T, W> {
    /// Create a new shell given a transport, the command tree and an output writer.
    pub fn new(transport: T, tree: Arc<CompletionTree>, writer: W) -> Self {
        Self {
            transport,
            tree,
            writer,
            prompt: DEFAULT_PROMPT.to_owned(),
            state: ShellState::Running,
        }
    }

    /// Replace the prompt printed before each command.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Write a line directly to the shell output.
    pub fn write_line(&mut self, message: &str) -> Result<()> {
        writeln!(self.writer, "{message}")?;
        Ok(())
    }

    /// Return the loop state.
    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Read and dispatch commands until quit, end of input or connection closure.
    pub fn run(&mut self, reader: &mut dyn LineReader) -> Result<()> {
        while self.state == ShellState::Running {
            if !reader.renders_prompt() {
                write!(self.writer, "{}", self.prompt)?;
                self.writer.flush()?;
            }
            let Some(line) = reader.read_line(&self.prompt)? else {
                if !reader.renders_prompt() {
                    writeln!(self.writer)?;
                }
                debug!("end of input");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            self.dispatch(&line)?;
        }
        self.state = ShellState::Terminated;
        Ok(())
    }

    /// Execute commands from a buffered reader until EOF or `quit` is encountered.
    pub fn run_script<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        while self.state == ShellState::Running {
            let Some(line) = read_lossy_line(&mut reader)? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            self.dispatch(&line)?;
        }
        self.state = ShellState::Terminated;
        Ok(())
    }

    fn dispatch(&mut self, line: &str) -> Result<()> {
        match self.execute(line) {
            Ok(CommandStatus::Continue) => {}
            Ok(CommandStatus::Quit) => self.state = ShellState::Terminated,
            Err(err) => {
                let closed = err
                    .downcast_ref::<ConnectionError>()
                    .is_some_and(ConnectionError::is_closed);
                if closed {
                    warn!("{err}");
                    self.state = ShellState::Terminated;
                } else {
                    writeln!(self.writer, "error: {err}")?;
                }
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Execute a single command line.
    pub fn execute(&mut self, line: &str) -> Result<CommandStatus> {
        let Some(command) = CommandLine::parse(line, &self.tree) else {
            return Ok(CommandStatus::Continue);
        };
        match command.head() {
            "help" if command.resolution() == Resolution::Unknown => {
                self.print_help()?;
                return Ok(CommandStatus::Continue);
            }
            "quit" | "exit" => {
                writeln!(self.writer, "closing session")?;
                return Ok(CommandStatus::Quit);
            }
            _ => {}
        }
        match command.resolution() {
            Resolution::Unknown => Err(anyhow!("unknown command '{}'", command.head())),
            Resolution::Namespace => match command.args().first() {
                Some(sub) => Err(anyhow!(
                    "unknown command '{} {sub}'",
                    command.path().join(" ")
                )),
                None => {
                    let group = command.path().join(" ");
                    let names: Vec<&str> = self
                        .tree
                        .lookup(&command.path().iter().map(String::as_str).collect::<Vec<_>>())
                        .and_then(|node| node.as_namespace())
                        .map(|namespace| namespace.keys().collect())
                        .unwrap_or_default();
                    Err(anyhow!(
                        "'{group}' requires a subcommand: {}",
                        names.join(", ")
                    ))
                }
            },
            Resolution::Command => {
                let request = command.render();
                let response = self.transport.request(&request)?;
                writeln!(self.writer, "{response}")?;
                Ok(CommandStatus::Continue)
            }
        }
    }

    fn print_help(&mut self) -> Result<()> {
        writeln!(self.writer, "Available commands:")?;
        for usage in self.tree.commands() {
            writeln!(self.writer, "  {usage}")?;
        }
        writeln!(self.writer, "  {}", LOCAL_COMMANDS.join(", "))?;
        Ok(())
    }

    /// Consume the shell and return owned transport and writer.
    pub fn into_parts(self) -> (T, W) {
        (self.transport, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use vrsh_core::{CommandSource, RegistryBuilder, StaticSource};

    #[derive(Default)]
    struct ScriptedTransport {
        sent: Vec<String>,
        responses: VecDeque<Result<String, ConnectionError>>,
        state: Option<ConnectionState>,
    }

    impl ScriptedTransport {
        fn respond(mut self, line: &str) -> Self {
            self.responses.push_back(Ok(line.to_owned()));
            self
        }

        fn close(mut self) -> Self {
            self.responses.push_back(Err(ConnectionError::Closed {
                reason: "connection closed by peer".to_owned(),
            }));
            self
        }
    }

    impl Transport for ScriptedTransport {
        fn send_line(&mut self, line: &str) -> Result<(), ConnectionError> {
            self.sent.push(line.to_owned());
            Ok(())
        }

        fn receive_line(&mut self) -> Result<String, ConnectionError> {
            let response = self.responses.pop_front().unwrap_or_else(|| {
                Err(ConnectionError::Closed {
                    reason: "no scripted response".to_owned(),
                })
            });
            if response.is_err() {
                self.state = Some(ConnectionState::Closed);
            }
            response
        }

        fn state(&self) -> ConnectionState {
            self.state.unwrap_or(ConnectionState::Connected)
        }
    }

    fn tree() -> Arc<CompletionTree> {
        let root = StaticSource::new("root")
            .with_operation("quit", &["self"])
            .with_operation("status", &["self"])
            .with_operation("setScreen", &["self", "screenSet"]);
        let set = StaticSource::new("set").with_operation("value", &["self", "x"]);
        Arc::new(RegistryBuilder::default().build([
            (None, &root as &dyn CommandSource),
            (Some("set"), &set as &dyn CommandSource),
        ]))
    }

    fn run_lines(
        transport: ScriptedTransport,
        input: &str,
    ) -> (ScriptedTransport, String, ShellState) {
        let mut shell = Shell::new(transport, tree(), Vec::new());
        let mut reader = PlainReader::new(Cursor::new(input.as_bytes().to_vec()));
        shell.run(&mut reader).unwrap();
        let state = shell.state();
        let (transport, output) = shell.into_parts();
        (transport, String::from_utf8(output).unwrap(), state)
    }

    #[test]
    fn forwards_commands_and_prints_responses() {
        let transport = ScriptedTransport::default()
            .respond("running")
            .respond("ok");
        let (transport, output, state) =
            run_lines(transport, "status\n\n  set   value 3 \nquit\n");
        assert_eq!(transport.sent, vec!["status", "set value 3"]);
        assert!(output.contains("running\n"));
        assert!(output.contains("ok\n"));
        assert!(output.contains("closing session"));
        assert_eq!(state, ShellState::Terminated);
    }

    #[test]
    fn invalid_utf8_line_is_reported_and_loop_continues() {
        let transport = ScriptedTransport::default().respond("running");
        let mut shell = Shell::new(transport, tree(), Vec::new());
        let mut reader = PlainReader::new(Cursor::new(b"\xff\nstatus\n".to_vec()));
        shell.run(&mut reader).unwrap();
        let (transport, output) = shell.into_parts();
        let rendered = String::from_utf8(output).unwrap();
        assert_eq!(transport.sent, vec!["status"]);
        assert!(rendered.contains("error: unknown command '\u{fffd}'"));
        assert!(rendered.contains("running\n"));
    }

    #[test]
    fn script_with_invalid_utf8_keeps_running() {
        let transport = ScriptedTransport::default().respond("running");
        let mut shell = Shell::new(transport, tree(), Vec::new());
        shell
            .run_script(Cursor::new(b"st\xffatus\nstatus\n".to_vec()))
            .unwrap();
        let (transport, output) = shell.into_parts();
        let rendered = String::from_utf8(output).unwrap();
        assert_eq!(transport.sent, vec!["status"]);
        assert!(rendered.starts_with("error: unknown command"));
    }

    #[test]
    fn quit_and_exit_stay_local() {
        for verb in ["quit", "exit"] {
            let input = format!("{verb}\nstatus\n");
            let (transport, output, _) = run_lines(ScriptedTransport::default(), &input);
            assert!(transport.sent.is_empty(), "{verb} was forwarded");
            assert!(output.contains("closing session"));
        }
    }

    #[test]
    fn unknown_commands_report_and_continue() {
        let transport = ScriptedTransport::default().respond("running");
        let (transport, output, _) = run_lines(transport, "frobnicate now\nstatus\n");
        assert!(output.contains("error: unknown command 'frobnicate'"));
        assert_eq!(transport.sent, vec!["status"]);
    }

    #[test]
    fn group_without_subcommand_lists_choices() {
        let (transport, output, _) = run_lines(ScriptedTransport::default(), "set\nset bogus\n");
        assert!(output.contains("error: 'set' requires a subcommand: value"));
        assert!(output.contains("error: unknown command 'set bogus'"));
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn connection_closed_terminates_gracefully() {
        let transport = ScriptedTransport::default().close();
        let (transport, output, state) = run_lines(transport, "status\nstatus\n");
        assert_eq!(transport.sent, vec!["status"]);
        assert_eq!(transport.state(), ConnectionState::Closed);
        assert_eq!(state, ShellState::Terminated);
        assert!(!output.contains("error:"));
    }

    #[test]
    fn end_of_input_terminates() {
        let (_, output, state) = run_lines(ScriptedTransport::default(), "");
        assert_eq!(state, ShellState::Terminated);
        assert!(output.starts_with(DEFAULT_PROMPT));
    }

    #[test]
    fn help_lists_the_command_tree() {
        let mut shell = Shell::new(ScriptedTransport::default(), tree(), Vec::new());
        assert_eq!(shell.execute("help").unwrap(), CommandStatus::Continue);
        let (_, output) = shell.into_parts();
        let rendered = String::from_utf8(output).unwrap();
        assert!(rendered.contains("set value <x>"));
        assert!(rendered.contains("setScreen <screenSet>"));
        assert!(rendered.contains("help, quit, exit"));
    }

    #[test]
    fn script_runs_without_prompt() {
        let transport = ScriptedTransport::default().respond("running");
        let mut shell = Shell::new(transport, tree(), Vec::new()).with_prompt("ctl> ");
        shell
            .run_script(Cursor::new(b"status\nquit\nstatus\n".to_vec()))
            .unwrap();
        let (transport, output) = shell.into_parts();
        let rendered = String::from_utf8(output).unwrap();
        assert_eq!(transport.sent, vec!["status"]);
        assert!(!rendered.contains("ctl> "));
        assert_eq!(rendered, "running\nclosing session\n");
    }
}
