//! The lifecycle run by the `start` process: arm, count down, alarm.

use tracing::info;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::storage::{ActiveStore, Config, PersistenceProvider};
use crate::timer::{
    ActiveTimer, AlarmController, AlarmOutcome, AlarmOutput, CountdownEngine, CountdownOutcome,
};

/// How a timer session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Stopped before expiry.
    Cancelled,
    /// Expired and the alarm ran until it was stopped, timed out, or failed
    /// to engage.
    Alarmed(AlarmOutcome),
}

/// Persist `timer` so other processes can see and stop it.
///
/// # Errors
///
/// Returns an error if the active collection cannot be read or written.
pub fn arm<P: PersistenceProvider>(store: &ActiveStore<P>, timer: &ActiveTimer) -> Result<(), StoreError> {
    store.load()?;
    store.upsert(timer.clone())?;
    info!(id = %timer.id, description = %timer.description, expiry = %timer.expiry, "timer armed");
    Ok(())
}

/// Count an already-armed timer down, then alarm until stopped.
///
/// # Errors
///
/// Returns an error if polling during the countdown fails or the alarm's
/// self-cleanup cannot be persisted.
pub async fn run<P, C, O, F>(
    store: &ActiveStore<P>,
    timer: &ActiveTimer,
    clock: C,
    output: O,
    config: &Config,
    on_tick: F,
) -> Result<SessionOutcome, StoreError>
where
    P: PersistenceProvider,
    C: Clock,
    O: AlarmOutput,
    F: FnMut(chrono::Duration),
{
    let countdown = CountdownEngine::new(store, clock, config.countdown.tick_interval());
    match countdown.run(timer, on_tick).await? {
        CountdownOutcome::Cancelled => Ok(SessionOutcome::Cancelled),
        CountdownOutcome::Expired => {
            let mut alarm = AlarmController::from_config(store, output, &config.alarm);
            let outcome = alarm.run(&timer.id).await?;
            Ok(SessionOutcome::Alarmed(outcome))
        }
    }
}
