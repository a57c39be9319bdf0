use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "upshift", version, about = "Run a resumable upgrade queue interactively")]
pub struct Cli {
    /// Settings file (defaults to ./upshift.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite database holding the queue
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Queue name
    #[arg(long, global = true, value_name = "NAME")]
    pub queue: Option<String>,

    /// More output (-v titles, -vv titles with callbacks)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a new upgrade from a plan, or resume an interrupted one
    Upgrade(UpgradeArgs),
    /// Show what is left in the queue
    Status,
}

#[derive(Debug, Args)]
pub struct UpgradeArgs {
    /// Plan file for a fresh upgrade
    #[arg(long, value_name = "FILE", required_unless_present_any = ["retry", "skip"])]
    pub plan: Option<PathBuf>,

    /// Resume, running the interrupted task again
    #[arg(long, conflicts_with_all = ["skip", "plan"])]
    pub retry: bool,

    /// Resume, dropping the interrupted task first
    #[arg(long, conflicts_with = "plan")]
    pub skip: bool,

    /// Ask before each task
    #[arg(long)]
    pub step: bool,

    /// Walk the queue without executing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Don't ask to confirm the plan notice
    #[arg(short, long)]
    pub yes: bool,
}
