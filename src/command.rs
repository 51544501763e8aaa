// Command table and line parsing. A line is split on whitespace into a
// command name and its arguments; the table below lists what the shell
// understands and is also what completion and `help` read from.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// What a command accepts after its name, for completion purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgHint {
    None,
    Flags(&'static [&'static str]),
    Directories,
    Files,
}

#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    pub hint: ArgHint,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "ls",
        usage: "ls [-l]",
        summary: "List the current directory",
        hint: ArgHint::Flags(&["-l"]),
    },
    CommandSpec {
        name: "cd",
        usage: "cd <dir>",
        summary: "Change the current directory",
        hint: ArgHint::Directories,
    },
    CommandSpec {
        name: "pwd",
        usage: "pwd",
        summary: "Show the current directory",
        hint: ArgHint::None,
    },
    CommandSpec {
        name: "rmdir",
        usage: "rmdir <dir>",
        summary: "Remove a directory",
        hint: ArgHint::Directories,
    },
    CommandSpec {
        name: "mkdir",
        usage: "mkdir <dir>",
        summary: "Create a directory",
        hint: ArgHint::None,
    },
    CommandSpec {
        name: "put",
        usage: "put <local-file> [name]",
        summary: "Upload a local file",
        hint: ArgHint::None,
    },
    CommandSpec {
        name: "get",
        usage: "get <name> [local-file]",
        summary: "Download a file",
        hint: ArgHint::Files,
    },
    CommandSpec {
        name: "rm",
        usage: "rm <name>",
        summary: "Remove a file",
        hint: ArgHint::Files,
    },
    CommandSpec {
        name: "stat",
        usage: "stat <name>",
        summary: "Show file metadata",
        hint: ArgHint::Files,
    },
    CommandSpec {
        name: "help",
        usage: "help",
        summary: "Show this help",
        hint: ArgHint::None,
    },
    CommandSpec {
        name: "exit",
        usage: "exit",
        summary: "Leave the shell",
        hint: ArgHint::None,
    },
];

/// Look a command up by name.
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List { long: bool },
    ChangeDirectory(String),
    PrintWorkingDirectory,
    RemoveDirectory(String),
    MakeDirectory(String),
    Upload { local: PathBuf, name: String },
    Download { name: String, local: PathBuf },
    RemoveFile(String),
    Stat(String),
    Help,
    Exit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{command}: missing {argument} argument (usage: {usage})")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
        usage: &'static str,
    },
}

/// Parse one input line. Blank lines give `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match name {
        "ls" => Command::List {
            long: args.iter().any(|a| *a == "-l"),
        },
        "cd" => Command::ChangeDirectory(required(&args, 0, "cd", "directory")?),
        "pwd" => Command::PrintWorkingDirectory,
        "rmdir" => Command::RemoveDirectory(required(&args, 0, "rmdir", "directory")?),
        "mkdir" => Command::MakeDirectory(required(&args, 0, "mkdir", "directory")?),
        "put" => {
            let local = PathBuf::from(required(&args, 0, "put", "local file")?);
            let name = match args.get(1) {
                Some(name) => name.to_string(),
                None => file_name(&local).ok_or(ParseError::MissingArgument {
                    command: "put",
                    argument: "name",
                    usage: usage_of("put"),
                })?,
            };
            Command::Upload { local, name }
        }
        "get" => {
            let name = required(&args, 0, "get", "file name")?;
            let local = args
                .get(1)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(&name));
            Command::Download { name, local }
        }
        "rm" => Command::RemoveFile(required(&args, 0, "rm", "file name")?),
        "stat" => Command::Stat(required(&args, 0, "stat", "file name")?),
        "help" => Command::Help,
        "exit" => Command::Exit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required(
    args: &[&str],
    index: usize,
    command: &'static str,
    argument: &'static str,
) -> Result<String, ParseError> {
    args.get(index)
        .map(|a| a.to_string())
        .ok_or(ParseError::MissingArgument {
            command,
            argument,
            usage: usage_of(command),
        })
}

fn usage_of(name: &str) -> &'static str {
    find(name).map(|spec| spec.usage).unwrap_or("")
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}
