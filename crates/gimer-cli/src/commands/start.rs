use std::io::Write;

use clap::Args;
use gimer_core::cancel;
use gimer_core::session::{self, SessionOutcome};
use gimer_core::storage::{self, ActiveStore, JsonFileProvider};
use gimer_core::timer::{format_hms, total_seconds, MultiAlarm};
use gimer_core::{
    ActiveTimer, AlarmOutcome, Clock, Config, SavedTimer, SystemClock, ValidationError,
};

use super::prompt;
use super::status::print_saved;

#[derive(Args)]
pub struct StartArgs {
    /// Set timer duration in seconds
    #[arg(short = 'S', long, default_value_t = 0, conflicts_with = "use_saved")]
    seconds: u64,
    /// Set timer duration in minutes
    #[arg(short = 'M', long, default_value_t = 0, conflicts_with = "use_saved")]
    minutes: u64,
    /// Set timer duration in hours
    #[arg(short = 'H', long, default_value_t = 0, conflicts_with = "use_saved")]
    hours: u64,
    /// Set a description for the timer
    #[arg(short, long, conflicts_with = "use_saved")]
    description: Option<String>,
    /// Also keep this timer as a saved template
    #[arg(short, long, conflicts_with = "use_saved")]
    save: bool,
    /// Choose a saved timer to start
    #[arg(short = 'u', long = "use")]
    use_saved: bool,
}

pub fn run(args: StartArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let active = storage::open_active(&config)?;

    let timer = if args.use_saved {
        match pick_saved(&config)? {
            Some(timer) => timer,
            None => return Ok(()),
        }
    } else {
        let secs = match total_seconds(args.seconds, args.minutes, args.hours) {
            Ok(secs) => secs,
            Err(e @ ValidationError::EmptyDuration) => {
                println!("{e}");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let description = args
            .description
            .unwrap_or_else(|| config.default_description.clone());
        ActiveTimer::arm(description, secs, SystemClock.now())?
    };

    session::arm(&active, &timer)?;

    if args.save {
        if let Err(e) = save_template(&config, &timer) {
            discard(&active, &timer);
            return Err(e);
        }
        println!("Saved timer: {}", timer.description);
    }

    println!(
        "Timer started: Description={}, Duration={}, ID={}",
        timer.description,
        format_hms(chrono::Duration::seconds(
            i64::try_from(timer.duration_secs).unwrap_or(i64::MAX)
        )),
        timer.id
    );

    let outcome = match countdown(&active, &timer, &config) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!();
            discard(&active, &timer);
            return Err(e);
        }
    };
    println!();
    match outcome {
        Some(SessionOutcome::Cancelled) => println!("Timer stopped: {}", timer.description),
        Some(SessionOutcome::Alarmed(AlarmOutcome::Stopped)) => println!("Sound stopped"),
        Some(SessionOutcome::Alarmed(AlarmOutcome::TimedOut)) => {
            println!("Alarm timed out after {}s", config.alarm.max_duration_secs)
        }
        Some(SessionOutcome::Alarmed(AlarmOutcome::OutputFailed)) => {
            println!("Timer finished: {} (alarm output unavailable)", timer.description)
        }
        None => {
            // Interrupted: drop our own record so it does not linger in status.
            cancel::stop(&active, &timer.id)?;
            println!("Interrupted; timer removed: {}", timer.description);
        }
    }
    Ok(())
}

/// Run the countdown and alarm; `None` when interrupted with Ctrl-C.
fn countdown(
    active: &ActiveStore<JsonFileProvider>,
    timer: &ActiveTimer,
    config: &Config,
) -> Result<Option<SessionOutcome>, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let output = MultiAlarm::from_config(&config.alarm);
    let description = timer.description.clone();
    let render = move |remaining: chrono::Duration| {
        let mut out = std::io::stdout();
        let _ = write!(out, "\r{description}  {}", format_hms(remaining));
        let _ = out.flush();
    };

    let outcome = runtime.block_on(async {
        tokio::select! {
            outcome = session::run(active, timer, SystemClock, output, config, render) => outcome.map(Some),
            _ = tokio::signal::ctrl_c() => Ok(None),
        }
    })?;
    Ok(outcome)
}

fn save_template(config: &Config, timer: &ActiveTimer) -> Result<(), Box<dyn std::error::Error>> {
    let saved = storage::open_saved(config)?;
    saved.upsert(SavedTimer::from(timer))?;
    Ok(())
}

/// Remove our own record after a failure so it does not linger in `status`.
fn discard(active: &ActiveStore<JsonFileProvider>, timer: &ActiveTimer) {
    if let Err(e) = cancel::stop(active, &timer.id) {
        eprintln!("warning: could not remove timer {}: {e}", timer.id);
    }
}

fn pick_saved(config: &Config) -> Result<Option<ActiveTimer>, Box<dyn std::error::Error>> {
    let saved = storage::open_saved(config)?;
    if saved.is_empty() {
        println!("No timers saved.");
        return Ok(None);
    }

    println!("Available timers:");
    print_saved(&saved);
    let Some(id) = prompt::select(&saved.index(), "start")? else {
        return Ok(None);
    };
    // The index was built from this same snapshot, so the ID is present.
    let Some(template) = saved.get(&id) else {
        return Ok(None);
    };
    Ok(Some(template.instantiate(SystemClock.now())?))
}
