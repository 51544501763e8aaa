// Command handlers. Each one performs at most one request against the file
// store and writes its result to `out`. Errors are returned to the shell
// loop, which prints them and shows the prompt again.

use crate::api::{ApiClient, DirEntry};
use crate::command::{Command, COMMANDS};
use crate::session::Session;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Whether the shell keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Run one parsed command against the session.
pub fn execute(
    api: &ApiClient,
    session: &mut Session,
    command: Command,
    out: &mut dyn Write,
) -> Result<Flow> {
    match command {
        Command::List { long } => list(api, session, long, out)?,
        Command::ChangeDirectory(dir) => change_directory(api, session, &dir, out)?,
        Command::PrintWorkingDirectory => writeln!(out, "{}", session.current_directory())?,
        Command::RemoveDirectory(name) => remove_directory(api, session, &name, out)?,
        Command::MakeDirectory(name) => make_directory(api, session, &name, out)?,
        Command::Upload { local, name } => upload(api, session, &local, &name, out)?,
        Command::Download { name, local } => download(api, session, &name, &local, out)?,
        Command::RemoveFile(name) => remove_file(api, session, &name, out)?,
        Command::Stat(name) => stat(api, session, &name, out)?,
        Command::Help => help(out)?,
        Command::Exit => {
            writeln!(out, "Exiting...")?;
            return Ok(Flow::Exit);
        }
    }
    Ok(Flow::Continue)
}

/// `ls [-l]`: print the entries of the current directory and remember
/// them for completion.
fn list(api: &ApiClient, session: &Session, long: bool, out: &mut dyn Write) -> Result<()> {
    let listing = api.list_directory(session.current_directory())?;
    session
        .known()
        .record(session.current_directory(), listing.as_deref().unwrap_or_default());
    // A `null` listing prints nothing; an empty array still ends its line.
    match listing {
        Some(entries) => show_entries(&entries, long, out),
        None => Ok(()),
    }
}

fn show_entries(entries: &[DirEntry], long: bool, out: &mut dyn Write) -> Result<()> {
    if long {
        for entry in entries {
            writeln!(out, "{} {}", entry.kind.flag(), entry.name)?;
        }
    } else {
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        writeln!(out, "{}", names.join(" "))?;
    }
    Ok(())
}

/// `cd <dir>`: move only once the server confirms the directory.
fn change_directory(
    api: &ApiClient,
    session: &mut Session,
    dir: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let candidate = session.resolve(dir);
    if api.directory_exists(&candidate)? {
        info!(from = session.current_directory(), to = %candidate, "changed directory");
        session.set_current_directory(candidate);
    } else {
        writeln!(out, "Invalid directory: {candidate}")?;
    }
    Ok(())
}

fn remove_directory(
    api: &ApiClient,
    session: &Session,
    name: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let path = session.child_path(name);
    writeln!(
        out,
        "Removing directory {name} -> {}",
        api.directory_url(&path)
    )?;
    api.delete_directory(&path)?;
    session.known().invalidate(session.current_directory());
    Ok(())
}

fn make_directory(
    api: &ApiClient,
    session: &Session,
    name: &str,
    out: &mut dyn Write,
) -> Result<()> {
    // The server addresses directories it creates with a trailing slash.
    let path = format!("{}/", session.child_path(name));
    api.create_directory(&path)?;
    session.known().invalidate(session.current_directory());
    writeln!(out, "Created directory {name}")?;
    Ok(())
}

fn upload(
    api: &ApiClient,
    session: &Session,
    local: &Path,
    name: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let data = fs::read(local).with_context(|| format!("Failed to read {}", local.display()))?;
    let size = data.len();
    api.upload_file(&session.child_path(name), data)?;
    session.known().invalidate(session.current_directory());
    writeln!(out, "Uploaded {} -> {name} ({size} bytes)", local.display())?;
    Ok(())
}

fn download(
    api: &ApiClient,
    session: &Session,
    name: &str,
    local: &Path,
    out: &mut dyn Write,
) -> Result<()> {
    let data = api.download_file(&session.child_path(name))?;
    fs::write(local, &data).with_context(|| format!("Failed to write {}", local.display()))?;
    writeln!(
        out,
        "Downloaded {name} -> {} ({} bytes)",
        local.display(),
        data.len()
    )?;
    Ok(())
}

fn remove_file(api: &ApiClient, session: &Session, name: &str, out: &mut dyn Write) -> Result<()> {
    api.delete_file(&session.child_path(name))?;
    session.known().invalidate(session.current_directory());
    writeln!(out, "Removed {name}")?;
    Ok(())
}

fn stat(api: &ApiClient, session: &Session, name: &str, out: &mut dyn Write) -> Result<()> {
    let headers = api.file_metadata(&session.child_path(name))?;
    for (key, value) in headers {
        writeln!(out, "{key}: {value}")?;
    }
    Ok(())
}

fn help(out: &mut dyn Write) -> Result<()> {
    let width = COMMANDS.iter().map(|c| c.usage.len()).max().unwrap_or(0);
    for spec in COMMANDS {
        writeln!(out, "  {:<width$}  {}", spec.usage, spec.summary)?;
    }
    Ok(())
}
