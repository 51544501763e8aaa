// Entrypoint for the `hss` command-line client.
// - Keeps `main` small: parse flags, set up logging, create an API client
//   and hand it to the shell loop or the smoke test.
// - Returns `anyhow::Result` so any setup failure ends with a message.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hss_cli::api::{ApiClient, DEFAULT_BASE_URL};
use hss_cli::smoke::SmokeTest;
use hss_cli::ui::{run_shell, ScriptedInput, TerminalPrompt};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Interactive shell for an HSS file store.
#[derive(Parser)]
#[command(name = "hss", version, about)]
struct Cli {
    /// Base URL of the file store
    #[arg(long, global = true, env = "HSS_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Log requests and navigation to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (default)
    Shell,

    /// Run the end-to-end smoke test against the server
    SmokeTest(SmokeArgs),
}

#[derive(Args)]
struct SmokeArgs {
    /// Directory created (and removed) by the test
    #[arg(long, default_value = "mydir")]
    dir: String,

    /// Local file uploaded by the test
    #[arg(long, default_value = "file.txt")]
    file: PathBuf,

    /// Expected MD5 of the downloaded file (defaults to the local file's)
    #[arg(long)]
    expected_md5: Option<String>,

    /// Server's backing directory, to verify files land on disk
    #[arg(long)]
    data_store: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // `HSS_LOG` wins over `--verbose`; logs go to stderr so they never mix
    // with command output.
    let filter = EnvFilter::try_from_env("HSS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "hss_cli=debug,hss=debug,warn" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let api = ApiClient::new(&cli.url)?;
    let mut stdout = io::stdout();

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            // Piped stdin has no terminal to edit on; read it line by line.
            if io::stdin().is_terminal() {
                run_shell(&api, &mut TerminalPrompt::new(&api)?, &mut stdout)?;
            } else {
                let mut input = ScriptedInput::new(io::stdin().lock());
                run_shell(&api, &mut input, &mut stdout)?;
            }
        }
        Commands::SmokeTest(args) => {
            let test = SmokeTest {
                directory: args.dir,
                file: args.file,
                expected_md5: args.expected_md5,
                data_store: args.data_store,
            };
            test.run(&api, &mut stdout)?;
        }
    }
    Ok(())
}
