//! Fleet — clone and cross-build a registry's worth of daemons.
//!
//! # Usage
//!
//! ```text
//! fleet [--include <names>] [--registry-url <url>] [--override-dir <dir>] [--dry-run]
//! fleet status [--json]
//!
//! global: [--config <file>] [--work-dir <dir>] [--output-dir <dir>] [-v]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{build::BuildArgs, status::StatusArgs, ConfigArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fleet",
    version,
    about = "Clone every registry project at its pinned version and build it for this host",
    long_about = None,
    args_conflicts_with_subcommands = true,
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(flatten)]
    build: BuildArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List artifacts recorded in the output directory.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.config.verbose);
    match cli.command {
        Some(Commands::Status(args)) => args.run(&cli.config),
        None => cli.build.run(&cli.config),
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
