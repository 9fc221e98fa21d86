use std::sync::Arc;

use clap::{Parser, Subcommand};
use pomotask_core::events::EventLog;
use pomotask_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "pomotask", version, about = "Pomodoro timer with per-task time tracking")]
struct Cli {
    /// Print the event log before exiting
    #[arg(long, global = true)]
    print_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Time statistics for the project
    Stats(commands::stats::StatsArgs),
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Project management
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
}

fn init_tracing() {
    let default_level = Config::path()
        .ok()
        .and_then(|path| Config::load_from(&path).ok())
        .map(|config| config.log_level)
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_env("POMOTASK_LOG")
        .or_else(|_| EnvFilter::try_new(&default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let log = Arc::new(EventLog::new());
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action, &log),
        Commands::Stats(args) => commands::stats::run(args, &log),
        Commands::Timer { action } => commands::timer::run(action, &log),
        Commands::Config { action } => commands::config::run(action),
        Commands::Project { action } => commands::project::run(action, &log),
    };

    if cli.print_log {
        for event in log.events() {
            println!("{event}");
        }
    }

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
