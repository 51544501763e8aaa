// End-to-end smoke test of a running file store: create a directory,
// upload a file into it, read it back and check its MD5, inspect it,
// then delete both. When the server keeps its data in a local directory
// (`data_store`), the backing files are checked as well.

use crate::api::ApiClient;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use md5::{Digest, Md5};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Inputs of one smoke-test run.
#[derive(Debug, Clone)]
pub struct SmokeTest {
    pub directory: String,
    pub file: PathBuf,
    /// Expected MD5 (hex) of the downloaded file. Defaults to the MD5 of
    /// the local file.
    pub expected_md5: Option<String>,
    /// Root of the server's backing store, if it is reachable locally.
    pub data_store: Option<PathBuf>,
}

/// Lowercase hex MD5 of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

impl SmokeTest {
    /// Run every step in order; the first failure stops the run.
    pub fn run(&self, api: &ApiClient, out: &mut dyn Write) -> Result<()> {
        let file_name = self
            .file
            .file_name()
            .and_then(|s| s.to_str())
            .with_context(|| format!("{} has no file name", self.file.display()))?
            .to_string();
        let content = fs::read(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let expected = match &self.expected_md5 {
            Some(sum) => sum.to_lowercase(),
            None => md5_hex(&content),
        };
        let dir_path = format!("{}/", self.directory);
        let file_path = format!("{}/{}", self.directory, file_name);

        step(out, "Create directory", || api.create_directory(&dir_path))?;

        let entries = step(out, "List directory files", || api.list_directory(&dir_path))?;
        writeln!(out, "{}", serde_json::to_string(&entries)?)?;

        step(out, "File Upload", || api.upload_file(&file_path, content))?;
        if let Some(backing) = self.backing_path(&file_name) {
            if !backing.exists() {
                bail!("File {} does not exist.", backing.display());
            }
        }

        let data = step(out, "File Download", || api.download_file(&file_path))?;
        let got = md5_hex(&data);
        if got != expected {
            bail!("File checksum mismatch: expected={expected} got={got}");
        }
        info!(md5 = %got, bytes = data.len(), "download verified");

        let headers = step(out, "File Head", || api.file_metadata(&file_path))?;
        if headers.is_empty() {
            bail!("HEAD {file_path} returned no headers");
        }
        for (key, value) in &headers {
            writeln!(out, "{key}: {value}")?;
        }

        step(out, "Remove file", || api.delete_file(&file_path))?;
        if let Some(backing) = self.backing_path(&file_name) {
            if backing.exists() {
                bail!("File {} was not deleted correctly.", backing.display());
            }
        }

        step(out, "Remove directory", || api.delete_directory(&dir_path))?;
        if let Some(backing) = self.backing_path("") {
            if backing.exists() {
                bail!("Directory {} was not deleted correctly.", backing.display());
            }
            writeln!(out, "Directory {} was deleted.", backing.display())?;
        }

        writeln!(out, "Smoke test passed")?;
        Ok(())
    }

    /// Location of `name` inside the test directory of the backing store.
    fn backing_path(&self, name: &str) -> Option<PathBuf> {
        self.data_store
            .as_deref()
            .map(|root: &Path| root.join(&self.directory).join(name))
    }
}

/// Announce a step, show a spinner while it runs and report how it went.
fn step<T, E>(out: &mut dyn Write, description: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T>
where
    E: std::error::Error + Send + Sync + 'static,
{
    writeln!(out, "Executing command: {description}")?;
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(description.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = f();
    match &result {
        Ok(_) => spinner.finish_with_message(format!("{description}: ok")),
        Err(_) => spinner.abandon_with_message(format!("{description}: failed")),
    }
    result.with_context(|| format!("{description} failed"))
}
