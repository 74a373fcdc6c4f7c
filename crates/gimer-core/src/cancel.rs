//! Cross-process cancellation.
//!
//! Stopping a timer means removing its record from the persisted collection.
//! The process that owns the countdown or alarm notices the absence on its
//! next poll; nothing here signals it directly, so cancellation is observed
//! within one poll interval, never synchronously.

use tracing::info;

use crate::error::StoreError;
use crate::storage::{PersistenceProvider, TimerStore};
use crate::timer::{TimerId, TimerRecord};

/// Result of stopping one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome<R> {
    Stopped(R),
    NotFound(TimerId),
}

/// Reload the collection and remove `id` from it.
///
/// Stopping an absent ID reports [`StopOutcome::NotFound`] and writes
/// nothing.
///
/// # Errors
///
/// Returns an error if the collection cannot be read or the removal cannot
/// be persisted. In the latter case the record is still present.
pub fn stop<R, P>(store: &TimerStore<R, P>, id: &TimerId) -> Result<StopOutcome<R>, StoreError>
where
    R: TimerRecord,
    P: PersistenceProvider,
{
    store.load()?;
    match store.remove(id) {
        Ok(record) => {
            info!(id = %id, "timer stopped");
            Ok(StopOutcome::Stopped(record))
        }
        Err(StoreError::NotFound(id)) => Ok(StopOutcome::NotFound(id)),
        Err(e) => Err(e),
    }
}

/// Reload the collection and clear it. Returns the records that were removed.
///
/// # Errors
///
/// Returns an error if the collection cannot be read or the cleared
/// collection cannot be persisted.
pub fn stop_all<R, P>(store: &TimerStore<R, P>) -> Result<Vec<R>, StoreError>
where
    R: TimerRecord,
    P: PersistenceProvider,
{
    store.load()?;
    let removed = store.records();
    store.remove_all()?;
    info!(count = removed.len(), "all timers stopped");
    Ok(removed)
}
