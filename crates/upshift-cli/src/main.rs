mod cli;
mod logging;
mod ops;
mod plan;
mod settings;

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use upshift_core::app::{ResumeMode, UpgradeSession};
use upshift_core::domain::{QueueSpec, Verbosity};
use upshift_core::impls::TerminalConsole;
use upshift_core::ports::Console;
use upshift_core::queue::QueueStore;
use upshift_core::{QueueRunner, RunnerConfig};

use crate::cli::{Cli, Command, UpgradeArgs};
use crate::plan::Plan;
use crate::settings::Settings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    logging::init_tracing(verbosity);

    let settings = Settings::load(cli.config.as_deref())?.with_overrides(cli.database, cli.queue);
    let store = QueueStore::open(&settings.database)
        .with_context(|| format!("failed to open {}", settings.database.display()))?;
    let session = UpgradeSession::new(&store, QueueSpec::sql(settings.queue.as_str()));

    match cli.command {
        Command::Upgrade(args) => upgrade(&session, args, verbosity).await,
        Command::Status => status(&session).await,
    }
}

async fn upgrade(session: &UpgradeSession<'_>, args: UpgradeArgs, verbosity: Verbosity) -> Result<()> {
    let console = TerminalConsole::stdio(verbosity);
    let app = ops::builtin_app()?;
    let mode = ResumeMode::from_flags(args.retry, args.skip);

    let tasks = match (&args.plan, mode.is_first_try()) {
        (Some(path), true) => {
            let plan = Plan::load(path)?;
            if let Some(notice) = &plan.notice {
                console.write_line(notice)?;
                if !args.yes && !console.confirm("Continue?", true)? {
                    bail!("Aborted");
                }
            }
            console.write_line(&format!("Preparing upgrade ({} tasks)", plan.len()))?;
            plan.into_tasks()
        }
        (None, true) => bail!("a fresh upgrade needs --plan"),
        (_, false) => {
            console.write_line("Resuming upgrade")?;
            Vec::new()
        }
    };

    let queue = session.prepare(mode, &tasks, &app.registry, &console).await?;

    console.write_line("Executing upgrade...")?;
    let config = RunnerConfig::new(args.dry_run, args.step);
    let runner = QueueRunner::new(&console, &queue, &app.registry, config);
    let summary = runner.run_all().await.with_context(|| {
        format!(
            "upgrade stopped; queue {} is kept, resume with --retry or --skip",
            session.spec().name
        )
    })?;

    let messages = session.messages().await?;
    if !messages.is_empty() {
        console.write_line(&format!("Upgrade outputs: \"{}\"", messages.join("\n")))?;
    }

    session.finish(args.dry_run)?;
    info!(run_id = %runner.run_id(), executed = summary.executed, skipped = summary.skipped, "upgrade finished");

    if args.dry_run {
        console.write_line(&format!("Dry run completed: {} task(s) listed", summary.processed()))?;
    } else {
        console.write_line(&format!(
            "Upgrade completed: {} executed, {} skipped",
            summary.executed, summary.skipped
        ))?;
    }
    Ok(())
}

async fn status(session: &UpgradeSession<'_>) -> Result<()> {
    match session.status().await? {
        Some(counts) => println!(
            "queue {}: {} pending ({} claimed)",
            session.spec().name,
            counts.total(),
            counts.claimed
        ),
        None => println!("queue {}: no upgrade in progress", session.spec().name),
    }
    Ok(())
}
