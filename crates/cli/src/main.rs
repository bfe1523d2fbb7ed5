mod cmd;
mod logging;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tasknotes_core::config::ConfigLoader;

#[derive(Debug, Parser)]
#[command(name = "tn", version, about = "Query the task and note cache of a markdown vault")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scan the vault and print cache statistics
    Stats(StatsArgs),

    /// List tasks, sorted by priority then title
    Tasks(TasksArgs),

    /// List notes created on a date
    Notes(NotesArgs),

    /// Print per-day task and note counts for a month
    Calendar(CalendarArgs),

    /// Keep the cache live from disk events and log every change
    Watch,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TasksArgs {
    /// Only tasks due on this date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,

    /// Only tasks falling on this date, recurring occurrences included
    #[arg(long, conflicts_with = "due")]
    pub on: Option<NaiveDate>,

    /// Only tasks with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Only tasks with this priority
    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct NotesArgs {
    /// Creation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CalendarArgs {
    /// Defaults to the current year
    #[arg(long)]
    pub year: Option<i32>,

    /// 1-12, defaults to the current month
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[arg(long)]
    pub json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let rc = ConfigLoader::load(cli.config.as_deref(), cli.profile.as_deref())
        .map_err(|e| eyre!("Configuration error: {e}"))?;
    let _log_guard = logging::init(&rc.logging)?;

    match cli.command {
        Commands::Stats(args) => cmd::stats::run(&rc, args).await,
        Commands::Tasks(args) => cmd::tasks::run(&rc, args).await,
        Commands::Notes(args) => cmd::notes::run(&rc, args).await,
        Commands::Calendar(args) => cmd::calendar::run(&rc, args).await,
        Commands::Watch => cmd::watch::run(&rc).await,
    }
}
