use clap::Args;
use gimer_core::cancel::{self, StopOutcome};
use gimer_core::storage;
use gimer_core::{Config, StoreError, TimerId};

use super::prompt;
use super::status::print_active;

#[derive(Args)]
pub struct StopArgs {
    /// Stop all timers
    #[arg(short, long)]
    all: bool,
    /// Stop the timer with this ID instead of choosing from a list
    #[arg(long, conflicts_with = "all")]
    id: Option<String>,
}

pub fn run(args: StopArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let active = storage::open_active(&config)?;

    if args.all {
        let removed = cancel::stop_all(&active)?;
        if removed.is_empty() {
            println!("No timers currently running.");
        } else {
            for timer in &removed {
                println!("Ended timer with description: {}", timer.description);
            }
        }
        return Ok(());
    }

    let id = match args.id {
        Some(id) => TimerId::from(id),
        None => {
            if active.is_empty() {
                println!("No timers currently running.");
                return Ok(());
            }
            println!("Available timers:");
            print_active(&active);
            match prompt::select(&active.index(), "stop")? {
                Some(id) => id,
                None => return Ok(()),
            }
        }
    };

    match cancel::stop(&active, &id)? {
        StopOutcome::Stopped(timer) => {
            println!("Ended timer with description: {}", timer.description);
            Ok(())
        }
        // Exit status 1 only for an explicit --id; the prompt path already
        // reported unknown numbers.
        StopOutcome::NotFound(id) => Err(StoreError::NotFound(id).into()),
    }
}
