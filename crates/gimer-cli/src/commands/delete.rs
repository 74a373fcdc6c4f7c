use clap::Args;
use gimer_core::cancel::{self, StopOutcome};
use gimer_core::storage;
use gimer_core::{Config, StoreError, TimerId};

use super::prompt;
use super::status::print_saved;

#[derive(Args)]
pub struct DeleteArgs {
    /// Delete the saved timer with this ID instead of choosing from a list
    #[arg(long)]
    id: Option<String>,
}

pub fn run(args: DeleteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let saved = storage::open_saved(&config)?;

    let id = match args.id {
        Some(id) => TimerId::from(id),
        None => {
            if saved.is_empty() {
                println!("No timers saved.");
                return Ok(());
            }
            println!("Saved timers:");
            print_saved(&saved);
            match prompt::select(&saved.index(), "delete")? {
                Some(id) => id,
                None => return Ok(()),
            }
        }
    };

    match cancel::stop(&saved, &id)? {
        StopOutcome::Stopped(timer) => {
            println!("Deleted saved timer: {}", timer.description);
            Ok(())
        }
        StopOutcome::NotFound(id) => Err(StoreError::NotFound(id).into()),
    }
}
