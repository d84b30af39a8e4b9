//! slnsync: merge a list of project files into a Visual Studio solution.
//!
//! # Usage
//!
//! ```text
//! slnsync <project-list> <solution-dir> <solution-name> [--strategy text|automation] [--dry-run] [--config <FILE>]
//! ```

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::sync::SyncArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "slnsync",
    version,
    about = "Add project files to a solution, creating the solution if needed",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    sync: SyncArgs,
}

/// Log to stderr so stdout carries only the summary.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    cli.sync.run()
}
