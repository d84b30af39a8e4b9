//! The sync run: load config, merge the list, print the summary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use slnsync_core::{config, Config, MergeOutcome};
use slnsync_host::FileHost;
use slnsync_sync::{pipeline, Strategy, SyncEngine, SyncRequest, SyncSummary};

/// Positional inputs plus run options.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// File listing one project path per line.
    pub project_list: PathBuf,

    /// Directory that holds (or will hold) the solution.
    pub solution_dir: PathBuf,

    /// Solution base name, without `.sln`.
    pub solution_name: String,

    /// How projects are merged: `text` edits the file, `automation` drives the host.
    #[arg(long, default_value_t = Strategy::Text)]
    pub strategy: Strategy,

    /// Report what would be added without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Config file to use instead of `~/.slnsync/config.yaml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.load_config()?;
        let host = FileHost::new(config.format.clone());
        let engine = SyncEngine::new(&host, config).dry_run(self.dry_run);
        let request = SyncRequest::new(
            &self.project_list,
            &self.solution_dir,
            self.solution_name.as_str(),
        );

        let summary = pipeline::run(&engine, &request, self.strategy).with_context(|| {
            format!(
                "sync failed for '{}'",
                request.solution_path().display()
            )
        })?;
        print_summary(&summary, self.dry_run);
        Ok(())
    }

    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => config::load_from(path)
                .with_context(|| format!("could not load config {}", path.display())),
            None => config::load().context("could not load config"),
        }
    }
}

fn print_summary(summary: &SyncSummary, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let solution = summary.solution.display();

    if summary.created {
        let verb = if dry_run { "would create" } else { "created" };
        println!("{prefix}{verb} {solution}");
    }
    println!(
        "{prefix}✓ '{solution}' synced ({} added, {} skipped)",
        summary.added(),
        summary.skipped()
    );
    for merge in &summary.merges {
        match merge {
            MergeOutcome::Added { path } => println!("  {}  {}", "+".green(), path.display()),
            MergeOutcome::WouldAdd { path } => println!("  {}  {}", "~".yellow(), path.display()),
            MergeOutcome::Skipped { path, reason } => {
                println!("  {}  {} ({reason})", "·".dimmed(), path.display())
            }
        }
    }
}
