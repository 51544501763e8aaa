// UI layer: the interactive shell loop.
//
// On a terminal, lines are read with a `rustyline` editor that has history
// and tab completion; Ctrl-C drops the line and Ctrl-D ends the session.
// When stdin is piped, lines are read as they come so the shell can be
// scripted; end of input ends the session.

use crate::api::ApiClient;
use crate::command;
use crate::commands::{self, Flow};
use crate::completion::ShellCompleter;
use crate::session::Session;
use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};
use std::io::{BufRead, Write};
use tracing::debug;

/// Prompt shown before each command.
pub const PROMPT: &str = "> ";

/// What reading one line produced.
#[derive(Debug, PartialEq, Eq)]
pub enum Prompted {
    Line(String),
    /// Ctrl-C at the prompt: drop the line and ask again.
    Interrupted,
    EndOfInput,
}

/// Where the shell gets its command lines from.
pub trait LineSource {
    fn read_line(&mut self, session: &Session) -> Result<Prompted>;
}

/// Map the outcome of one line-editor read onto [`Prompted`]. Ctrl-C
/// comes back as `Interrupted` and Ctrl-D as `Eof`.
pub fn prompted(read: Result<String, ReadlineError>) -> Result<Prompted> {
    match read {
        Ok(line) => Ok(Prompted::Line(line)),
        Err(ReadlineError::Interrupted) => Ok(Prompted::Interrupted),
        Err(ReadlineError::Eof) => Ok(Prompted::EndOfInput),
        Err(err) => Err(err).context("Failed to read command"),
    }
}

/// Interactive terminal input with history and tab completion.
pub struct TerminalPrompt<'a> {
    api: &'a ApiClient,
    editor: Editor<ShellCompleter, DefaultHistory>,
}

impl<'a> TerminalPrompt<'a> {
    pub fn new(api: &'a ApiClient) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .completion_type(CompletionType::List)
            .build();
        let editor = Editor::with_config(config).context("Failed to set up the terminal")?;
        Ok(TerminalPrompt { api, editor })
    }
}

impl LineSource for TerminalPrompt<'_> {
    fn read_line(&mut self, session: &Session) -> Result<Prompted> {
        self.editor
            .set_helper(Some(ShellCompleter::new(self.api, session)));
        prompted(self.editor.readline(PROMPT))
    }
}

/// Lines from any buffered reader, e.g. a piped stdin. Bytes that are not
/// UTF-8 are replaced rather than ending the session.
pub struct ScriptedInput<R> {
    reader: R,
}

impl<R: BufRead> ScriptedInput<R> {
    pub fn new(reader: R) -> Self {
        ScriptedInput { reader }
    }
}

impl<R: BufRead> LineSource for ScriptedInput<R> {
    fn read_line(&mut self, _session: &Session) -> Result<Prompted> {
        let mut buf = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut buf)
            .context("Failed to read command")?;
        if read == 0 {
            return Ok(Prompted::EndOfInput);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(Prompted::Line(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Run the shell until `exit` or end of input. Command failures are
/// printed and never end the loop; only a broken input or output does.
pub fn run_shell(api: &ApiClient, input: &mut dyn LineSource, out: &mut dyn Write) -> Result<()> {
    let mut session = Session::new();
    loop {
        let line = match input.read_line(&session)? {
            Prompted::Line(line) => line,
            Prompted::Interrupted => continue,
            Prompted::EndOfInput => break,
        };

        let command = match command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };

        debug!(?command, cwd = session.current_directory(), "executing");
        match commands::execute(api, &mut session, command, out) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(err) => writeln!(out, "Error: {err:#}")?,
        }
        out.flush()?;
    }
    Ok(())
}
