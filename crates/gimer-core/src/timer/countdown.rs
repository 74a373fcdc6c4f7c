//! Countdown engine.
//!
//! Drives one active timer from armed to expired. Other processes can only
//! reach this one through the persisted collection, so every tick re-reads
//! it and treats a missing record as cancellation.
//!
//! ## State Transitions
//!
//! ```text
//! Armed -> Expired   (expiry reached, hand off to the alarm)
//! Armed -> Cancelled (record removed by another process)
//! ```

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use super::ActiveTimer;
use crate::clock::Clock;
use crate::error::StoreError;
use crate::storage::{ActiveStore, PersistenceProvider};

/// How a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    /// Expiry reached while the record was still present.
    Expired,
    /// The record disappeared from the store before expiry.
    Cancelled,
}

pub struct CountdownEngine<'a, P, C> {
    store: &'a ActiveStore<P>,
    clock: C,
    tick: Duration,
}

impl<'a, P: PersistenceProvider, C: Clock> CountdownEngine<'a, P, C> {
    pub fn new(store: &'a ActiveStore<P>, clock: C, tick: Duration) -> Self {
        Self { store, clock, tick }
    }

    /// Count `timer` down, calling `on_tick` with the remaining time once
    /// per tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read while polling.
    pub async fn run<F>(&self, timer: &ActiveTimer, mut on_tick: F) -> Result<CountdownOutcome, StoreError>
    where
        F: FnMut(chrono::Duration),
    {
        loop {
            let now = self.clock.now();
            if timer.is_expired(now) {
                info!(id = %timer.id, "timer expired");
                return Ok(CountdownOutcome::Expired);
            }

            self.store.load()?;
            if !self.store.contains(&timer.id) {
                info!(id = %timer.id, "timer cancelled before expiry");
                return Ok(CountdownOutcome::Cancelled);
            }

            let remaining = timer.remaining(now);
            on_tick(remaining);
            debug!(id = %timer.id, remaining_ms = remaining.num_milliseconds(), "tick");

            // Never sleep past the expiry itself.
            let until_expiry = remaining.to_std().unwrap_or_default();
            sleep(self.tick.min(until_expiry)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryProvider, TimerStore};
    use chrono::{DateTime, TimeZone, Utc};
    use tokio::time::Instant;

    /// Wall clock that follows tokio's (paused) virtual time.
    struct VirtualClock {
        base: DateTime<Utc>,
        start: Instant,
    }

    impl VirtualClock {
        fn new() -> Self {
            Self {
                base: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                start: Instant::now(),
            }
        }
    }

    impl Clock for VirtualClock {
        fn now(&self) -> DateTime<Utc> {
            self.base + chrono::Duration::from_std(self.start.elapsed()).unwrap()
        }
    }

    fn armed(provider: &MemoryProvider, clock: &VirtualClock, secs: u64) -> (ActiveStore<MemoryProvider>, ActiveTimer) {
        let store = TimerStore::open(provider.clone(), true).unwrap();
        let timer = ActiveTimer::arm("tea", secs, clock.now()).unwrap();
        store.upsert(timer.clone()).unwrap();
        (store, timer)
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_duration() {
        let provider = MemoryProvider::new();
        let clock = VirtualClock::new();
        let (store, timer) = armed(&provider, &clock, 3);

        let start = Instant::now();
        let mut ticks = Vec::new();
        let outcome = CountdownEngine::new(&store, &clock, Duration::from_secs(1))
            .run(&timer, |r| ticks.push(r.num_seconds()))
            .await
            .unwrap();

        assert_eq!(outcome, CountdownOutcome::Expired);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(ticks, vec![3, 2, 1]);
        assert!(store.contains(&timer.id));
    }

    #[tokio::test(start_paused = true)]
    async fn external_removal_cancels_within_one_tick() {
        let provider = MemoryProvider::new();
        let clock = VirtualClock::new();
        let (store, timer) = armed(&provider, &clock, 60);

        let other: ActiveStore<_> = TimerStore::open(provider.clone(), true).unwrap();
        let id = timer.id.clone();
        let stopper = tokio::spawn(async move {
            sleep(Duration::from_millis(5500)).await;
            other.remove(&id).unwrap();
            Instant::now()
        });

        let outcome = CountdownEngine::new(&store, &clock, Duration::from_secs(1))
            .run(&timer, |_| {})
            .await
            .unwrap();
        let stopped_at = stopper.await.unwrap();

        assert_eq!(outcome, CountdownOutcome::Cancelled);
        assert!(Instant::now() - stopped_at <= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn already_expired_timer_skips_polling() {
        let provider = MemoryProvider::new();
        let clock = VirtualClock::new();
        let store: ActiveStore<_> = TimerStore::open(provider, true).unwrap();
        let timer = ActiveTimer::arm("late", 1, clock.now() - chrono::Duration::seconds(10)).unwrap();

        let outcome = CountdownEngine::new(&store, &clock, Duration::from_secs(1))
            .run(&timer, |_| panic!("no tick expected"))
            .await
            .unwrap();
        assert_eq!(outcome, CountdownOutcome::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn sub_tick_remainder_does_not_oversleep() {
        let provider = MemoryProvider::new();
        let clock = VirtualClock::new();
        let (store, timer) = armed(&provider, &clock, 2);

        let start = Instant::now();
        CountdownEngine::new(&store, &clock, Duration::from_millis(1500))
            .run(&timer, |_| {})
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }
}
