//! In-memory timer collection synchronized with a persistence provider.
//!
//! Every process rebuilds the collection from disk on each command and
//! re-reads it while polling. Each mutation writes the complete collection
//! back before returning. The mutex only serializes access inside one
//! process; between processes the last writer wins.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::provider::PersistenceProvider;
use crate::error::StoreError;
use crate::timer::{ActiveTimer, SavedTimer, TimerId, TimerRecord};

type Records<R> = IndexMap<TimerId, R>;

pub type ActiveStore<P> = TimerStore<ActiveTimer, P>;
pub type SavedStore<P> = TimerStore<SavedTimer, P>;

/// Timer collection keyed by ID, persisted as a single JSON object.
pub struct TimerStore<R, P> {
    provider: P,
    records: Mutex<Records<R>>,
    repair_corrupt: bool,
}

impl<R: TimerRecord, P: PersistenceProvider> TimerStore<R, P> {
    /// Create an empty store over `provider` without reading it.
    ///
    /// With `repair_corrupt`, a collection that fails to decode is
    /// overwritten with an empty snapshot during [`load`](Self::load).
    pub fn new(provider: P, repair_corrupt: bool) -> Result<Self, StoreError> {
        provider.init()?;
        Ok(Self {
            provider,
            records: Mutex::new(IndexMap::new()),
            repair_corrupt,
        })
    }

    /// Create the store and load the current snapshot.
    pub fn open(provider: P, repair_corrupt: bool) -> Result<Self, StoreError> {
        let store = Self::new(provider, repair_corrupt)?;
        store.load()?;
        Ok(store)
    }

    /// Replace the in-memory collection with the persisted snapshot.
    ///
    /// An absent or empty snapshot yields an empty collection. A snapshot
    /// that fails to decode, including one that is not valid UTF-8, also
    /// yields an empty collection; only read failures are returned.
    pub fn load(&self) -> Result<(), StoreError> {
        let loaded = match self.provider.read()? {
            None => Records::new(),
            Some(content) => match serde_json::from_slice::<Records<R>>(&content) {
                Ok(records) => records,
                Err(e) => {
                    warn!(error = %e, "timer collection is corrupt, starting empty");
                    if self.repair_corrupt {
                        if let Err(e) = self.provider.write("{}") {
                            warn!(error = %e, "failed to overwrite corrupt timer collection");
                        }
                    }
                    Records::new()
                }
            },
        };
        debug!(count = loaded.len(), "loaded timer collection");
        *self.lock() = loaded;
        Ok(())
    }

    /// Write the full in-memory collection, replacing prior content.
    pub fn save(&self) -> Result<(), StoreError> {
        let records = self.lock();
        self.persist(&records)
    }

    /// Insert or replace a record, then persist.
    ///
    /// On a failed write the in-memory collection is left as it was.
    pub fn upsert(&self, record: R) -> Result<(), StoreError> {
        self.mutate(|records| {
            records.insert(record.id().clone(), record);
        })
    }

    /// Delete a record, then persist.
    ///
    /// Returns [`StoreError::NotFound`] without writing when the ID is absent.
    /// If the write fails the record is restored in memory and the error is
    /// returned, so a failed stop never looks like a successful one.
    pub fn remove(&self, id: &TimerId) -> Result<R, StoreError> {
        if !self.contains(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        self.mutate(|records| records.shift_remove(id))?
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Clear the collection and persist. Returns the number of removed records.
    ///
    /// On a failed write the in-memory collection is rolled back. The file
    /// itself is replaced atomically, so it holds either the old or the new
    /// snapshot.
    pub fn remove_all(&self) -> Result<usize, StoreError> {
        self.mutate(|records| {
            let count = records.len();
            records.clear();
            count
        })
    }

    pub fn get(&self, id: &TimerId) -> Option<R> {
        self.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &TimerId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Records in iteration order.
    pub fn records(&self) -> Vec<R> {
        self.lock().values().cloned().collect()
    }

    /// Number the current records 1..=N in iteration order.
    pub fn index(&self) -> TimerIndex {
        TimerIndex {
            ids: self.lock().keys().cloned().collect(),
        }
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Records<R>) -> T) -> Result<T, StoreError> {
        let mut records = self.lock();
        let previous = records.clone();
        let out = f(&mut records);
        if let Err(e) = self.persist(&records) {
            *records = previous;
            return Err(e);
        }
        Ok(out)
    }

    fn persist(&self, records: &Records<R>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;
        self.provider.write(&json)?;
        debug!(count = records.len(), "saved timer collection");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Records<R>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ephemeral 1-based numbering of timer IDs for "type a number" prompts.
///
/// Only valid for the invocation that built it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerIndex {
    ids: Vec<TimerId>,
}

impl TimerIndex {
    /// Look up the ID shown as `number`.
    pub fn resolve(&self, number: usize) -> Option<&TimerId> {
        number.checked_sub(1).and_then(|i| self.ids.get(i))
    }

    /// `(number, id)` pairs starting at 1.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TimerId)> {
        self.ids.iter().enumerate().map(|(i, id)| (i + 1, id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
