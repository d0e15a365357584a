//! guidesync: publish a local documentation tree to a help-center store.
//!
//! # Usage
//!
//! ```text
//! guidesync sync [--dir <root>] [--clean] [--force-update] [--profile <p>]
//! guidesync sync --print-only [--out-dir <dir>]
//! guidesync delete-all --yes
//! guidesync render <file>
//! ```
//!
//! Exit status is 1 for configuration errors and 2 when the remote client
//! cannot be set up. A run that records failures still exits 0; the summary
//! shows them.

mod commands;
mod settings;
mod summary;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use commands::{delete_all::DeleteAllArgs, render::RenderArgs, sync::SyncArgs};
use settings::ClientInitError;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "guidesync",
    version,
    about = "Publish a directory of documents to a help-center knowledge base",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags accepted by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Settings file (default: ~/.guidesync/config.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit the run summary as JSON.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile a content tree with the remote store.
    Sync(SyncArgs),

    /// Delete every article in the remote store.
    DeleteAll(DeleteAllArgs),

    /// Render one document and print it without contacting the remote.
    Render(RenderArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let result = match cli.command {
        Commands::Sync(args) => args.run(&cli.global),
        Commands::DeleteAll(args) => args.run(&cli.global),
        Commands::Render(args) => args.run(&cli.global),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            if e.downcast_ref::<ClientInitError>().is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
