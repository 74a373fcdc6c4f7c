use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gimer", version, about = "A CLI timer tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new timer and count it down in this terminal
    Start(commands::start::StartArgs),
    /// Stop a running timer or a ringing alarm
    Stop(commands::stop::StopArgs),
    /// Display the current status of all timers
    Status(commands::status::StatusArgs),
    /// Delete a saved timer
    Delete(commands::delete::DeleteArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays reserved for command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("GIMER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Start(args) => commands::start::run(args),
        Commands::Stop(args) => commands::stop::run(args),
        Commands::Status(args) => commands::status::run(args),
        Commands::Delete(args) => commands::delete::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
