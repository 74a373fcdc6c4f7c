use clap::Args;
use gimer_core::storage::{self, TimerStore};
use gimer_core::timer::format_hms;
use gimer_core::{ActiveTimer, Clock, Config, PersistenceProvider, SavedTimer, SystemClock};

#[derive(Args)]
pub struct StatusArgs {
    /// Show saved timers instead of running ones
    #[arg(long)]
    saved: bool,
    /// Print the collection as JSON
    #[arg(long)]
    json: bool,
}

/// One line per active timer, numbered in store order.
pub fn active_lines(timers: &[ActiveTimer], now: chrono::DateTime<chrono::Utc>) -> Vec<String> {
    timers
        .iter()
        .enumerate()
        .map(|(i, timer)| {
            format!(
                "[{}] Description: {}, Remaining: {}, ID: {}",
                i + 1,
                timer.description,
                format_hms(timer.remaining(now)),
                timer.id
            )
        })
        .collect()
}

/// One line per saved timer, numbered in store order.
pub fn saved_lines(timers: &[SavedTimer]) -> Vec<String> {
    timers
        .iter()
        .enumerate()
        .map(|(i, timer)| {
            let duration = chrono::Duration::seconds(i64::try_from(timer.duration_secs).unwrap_or(i64::MAX));
            format!(
                "[{}] Description: {}, Duration: {}",
                i + 1,
                timer.description,
                format_hms(duration)
            )
        })
        .collect()
}

pub fn print_active<P: PersistenceProvider>(store: &TimerStore<ActiveTimer, P>) {
    for line in active_lines(&store.records(), SystemClock.now()) {
        println!("{line}");
    }
}

pub fn print_saved<P: PersistenceProvider>(store: &TimerStore<SavedTimer, P>) {
    for line in saved_lines(&store.records()) {
        println!("{line}");
    }
}

pub fn run(args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    if args.saved {
        let saved = storage::open_saved(&config)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&saved.records())?);
        } else if saved.is_empty() {
            println!("No timers saved.");
        } else {
            println!("Saved timers:");
            print_saved(&saved);
        }
        return Ok(());
    }

    let active = storage::open_active(&config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&active.records())?);
    } else if active.is_empty() {
        println!("No timers currently running.");
    } else {
        println!("Current timers:");
        print_active(&active);
    }
    Ok(())
}
