// Tab completion for the shell prompt.
//
// The first word completes against the command table. The second word
// completes against that command's hints: fixed flags, or the names of
// directories/files in the current directory as last seen by a listing.
// When nothing is known yet about the current directory it is listed once.
// Several matches are narrowed to their shared prefix by the line editor.

use crate::api::{ApiClient, EntryKind};
use crate::command::{self, ArgHint, COMMANDS};
use crate::session::{DirCache, Session};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::rc::Rc;
use tracing::debug;

/// Candidates for the word being typed at the end of `line`.
///
/// `names` is asked for directory or file names of the current directory
/// and only called when the command takes such an argument.
pub fn candidates(line: &str, mut names: impl FnMut(EntryKind) -> Vec<String>) -> Vec<String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let typing_new_word = line.is_empty() || line.ends_with(char::is_whitespace);

    let (command, prefix) = match (words.as_slice(), typing_new_word) {
        ([], _) => (None, ""),
        ([first], false) => (None, *first),
        ([first], true) => (Some(*first), ""),
        ([first, second], false) => (Some(*first), *second),
        _ => return Vec::new(),
    };

    let Some(command) = command else {
        return COMMANDS
            .iter()
            .map(|spec| spec.name)
            .filter(|name| name.starts_with(prefix))
            .map(str::to_string)
            .collect();
    };

    let hints = match command::find(command).map(|spec| spec.hint) {
        Some(ArgHint::Flags(flags)) => flags.iter().map(|f| f.to_string()).collect(),
        Some(ArgHint::Directories) => names(EntryKind::Directory),
        Some(ArgHint::Files) => names(EntryKind::File),
        Some(ArgHint::None) | None => Vec::new(),
    };
    hints
        .into_iter()
        .filter(|hint| hint.starts_with(prefix))
        .collect()
}

/// Byte offset where the word being typed at the end of `line` starts.
fn word_start(line: &str) -> usize {
    let current = line.rsplit(char::is_whitespace).next().unwrap_or("");
    line.len() - current.len()
}

/// Line editor helper: completes the line from the command table and the
/// entries of the current remote directory.
///
/// Built afresh for every prompt so it sees the current directory.
pub struct ShellCompleter {
    api: ApiClient,
    known: Rc<DirCache>,
    cwd: String,
}

impl ShellCompleter {
    pub fn new(api: &ApiClient, session: &Session) -> Self {
        ShellCompleter {
            api: api.clone(),
            known: session.shared_known(),
            cwd: session.current_directory().to_string(),
        }
    }

    /// Start of the word being completed and its replacements. A command
    /// name is followed by a space so the argument can be typed next.
    pub fn complete_words(&self, line: &str) -> (usize, Vec<String>) {
        let start = word_start(line);
        let sep = if line[..start].trim().is_empty() { " " } else { "" };
        let words = candidates(line, |kind| self.names(kind))
            .into_iter()
            .map(|word| format!("{word}{sep}"))
            .collect();
        (start, words)
    }

    fn names(&self, kind: EntryKind) -> Vec<String> {
        if let Some(names) = self.known.names(&self.cwd, kind) {
            return names;
        }
        match self.api.list_directory(&self.cwd) {
            Ok(entries) => {
                self.known.record(&self.cwd, &entries.unwrap_or_default());
                self.known.names(&self.cwd, kind).unwrap_or_default()
            }
            Err(err) => {
                debug!(error = %err, "could not list directory for completion");
                Vec::new()
            }
        }
    }
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.complete_words(&line[..pos]);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.trim_end().to_string(),
                replacement: word,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellCompleter {
    type Hint = String;
}

impl Highlighter for ShellCompleter {}

impl Validator for ShellCompleter {}

impl Helper for ShellCompleter {}
