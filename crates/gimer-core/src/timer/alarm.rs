//! Alarm controller.
//!
//! Once a timer expires the controller engages an [`AlarmOutput`] and polls
//! the store until the record disappears (someone ran `stop`) or the ceiling
//! is reached, in which case it disengages and removes the record itself.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use super::TimerId;
use crate::cancel;
use crate::error::{AlarmError, StoreError};
use crate::storage::{AlarmConfig, ActiveStore, PersistenceProvider};

/// Sink for the audible alert. Alarm fidelity is best-effort.
pub trait AlarmOutput: Send {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Start alerting until [`stop`](Self::stop) is called.
    fn play(&mut self) -> Result<(), AlarmError>;

    /// Stop alerting. Calling it when not playing is a no-op.
    fn stop(&mut self);
}

impl<O: AlarmOutput + ?Sized> AlarmOutput for Box<O> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn play(&mut self) -> Result<(), AlarmError> {
        (**self).play()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// How an alarm ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmOutcome {
    /// The record was removed by another process.
    Stopped,
    /// Nobody stopped the alarm before the ceiling; the record was removed.
    TimedOut,
    /// The output could not be engaged; the record was removed.
    OutputFailed,
}

pub struct AlarmController<'a, P, O: AlarmOutput> {
    store: &'a ActiveStore<P>,
    output: O,
    poll_interval: Duration,
    max_duration: Duration,
}

impl<'a, P: PersistenceProvider, O: AlarmOutput> AlarmController<'a, P, O> {
    pub fn new(store: &'a ActiveStore<P>, output: O, poll_interval: Duration, max_duration: Duration) -> Self {
        Self {
            store,
            output,
            poll_interval,
            max_duration,
        }
    }

    pub fn from_config(store: &'a ActiveStore<P>, output: O, config: &AlarmConfig) -> Self {
        Self::new(store, output, config.poll_interval(), config.max_duration())
    }

    /// Alarm for timer `id` until stopped or timed out.
    ///
    /// Poll failures are logged and polling continues; the ceiling still
    /// bounds the alarm.
    ///
    /// # Errors
    ///
    /// Returns an error only if removing the record after a timeout or an
    /// output failure cannot be read or persisted.
    pub async fn run(&mut self, id: &TimerId) -> Result<AlarmOutcome, StoreError> {
        if let Err(e) = self.output.play() {
            warn!(id = %id, error = %e, "alarm output unavailable");
            self.clean_up(id)?;
            return Ok(AlarmOutcome::OutputFailed);
        }
        info!(id = %id, output = self.output.name(), "alarm engaged");

        let started = Instant::now();
        let outcome = loop {
            match self.store.load() {
                Ok(()) if !self.store.contains(id) => break AlarmOutcome::Stopped,
                Ok(()) => {}
                Err(e) => warn!(id = %id, error = %e, "failed to poll timer store"),
            }

            let elapsed = started.elapsed();
            if elapsed >= self.max_duration {
                break AlarmOutcome::TimedOut;
            }
            sleep(self.poll_interval.min(self.max_duration - elapsed)).await;
        };

        self.output.stop();
        info!(id = %id, ?outcome, "alarm disengaged");

        if outcome == AlarmOutcome::TimedOut {
            self.clean_up(id)?;
        }
        Ok(outcome)
    }

    /// Remove the record from a fresh snapshot so timers armed by other
    /// processes since the last poll survive.
    fn clean_up(&self, id: &TimerId) -> Result<(), StoreError> {
        cancel::stop(self.store, id).map(drop)
    }
}

impl<P, O: AlarmOutput> Drop for AlarmController<'_, P, O> {
    fn drop(&mut self) {
        self.output.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryProvider, TimerStore};
    use crate::timer::ActiveTimer;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    impl Recorder {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AlarmOutput for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn play(&mut self) -> Result<(), AlarmError> {
            if self.fail {
                return Err(AlarmError::EngageFailed {
                    output: "recorder".into(),
                    message: "no device".into(),
                });
            }
            self.calls.lock().unwrap().push("play");
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop");
        }
    }

    fn expired_timer(provider: &MemoryProvider) -> (ActiveStore<MemoryProvider>, TimerId) {
        let store = TimerStore::open(provider.clone(), true).unwrap();
        let timer = ActiveTimer::arm("tea", 1, Utc::now()).unwrap();
        let id = timer.id.clone();
        store.upsert(timer).unwrap();
        (store, id)
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_at_ceiling_and_removes_record() {
        let provider = MemoryProvider::new();
        let (store, id) = expired_timer(&provider);
        let output = Recorder::default();

        let start = Instant::now();
        let outcome = AlarmController::new(&store, output.clone(), Duration::from_secs(1), Duration::from_secs(300))
            .run(&id)
            .await
            .unwrap();

        assert_eq!(outcome, AlarmOutcome::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_secs(300));
        assert_eq!(&output.calls()[..2], &["play", "stop"]);

        let fresh: ActiveStore<_> = TimerStore::open(provider, true).unwrap();
        assert!(!fresh.contains(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn external_stop_disengages_within_one_poll() {
        let provider = MemoryProvider::new();
        let (store, id) = expired_timer(&provider);
        let output = Recorder::default();

        let other: ActiveStore<_> = TimerStore::open(provider.clone(), true).unwrap();
        let stopper = tokio::spawn(async move {
            sleep(Duration::from_millis(2300)).await;
            other.load().unwrap();
            other.remove_all().unwrap();
            Instant::now()
        });

        let outcome = AlarmController::new(&store, output.clone(), Duration::from_secs(1), Duration::from_secs(300))
            .run(&id)
            .await
            .unwrap();
        let stopped_at = stopper.await.unwrap();

        assert_eq!(outcome, AlarmOutcome::Stopped);
        assert!(Instant::now() - stopped_at <= Duration::from_secs(1));
        assert_eq!(&output.calls()[..2], &["play", "stop"]);
    }

    #[tokio::test(start_paused = true)]
    async fn output_failure_skips_alarm_and_cleans_up() {
        let provider = MemoryProvider::new();
        let (store, id) = expired_timer(&provider);
        let output = Recorder {
            fail: true,
            ..Recorder::default()
        };

        let start = Instant::now();
        let outcome = AlarmController::new(&store, output, Duration::from_secs(1), Duration::from_secs(300))
            .run(&id)
            .await
            .unwrap();

        assert_eq!(outcome, AlarmOutcome::OutputFailed);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(!store.contains(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn output_failure_cleanup_keeps_timers_armed_elsewhere() {
        let provider = MemoryProvider::new();
        let (store, id) = expired_timer(&provider);

        // Armed by another process after this store's last read.
        let other: ActiveStore<_> = TimerStore::open(provider.clone(), true).unwrap();
        let pasta = ActiveTimer::arm("pasta", 600, Utc::now()).unwrap();
        other.upsert(pasta.clone()).unwrap();

        let output = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let outcome = AlarmController::new(&store, output, Duration::from_secs(1), Duration::from_secs(300))
            .run(&id)
            .await
            .unwrap();

        assert_eq!(outcome, AlarmOutcome::OutputFailed);
        let fresh: ActiveStore<_> = TimerStore::open(provider, true).unwrap();
        assert!(!fresh.contains(&id));
        assert!(fresh.contains(&pasta.id));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_controller_stops_output() {
        let provider = MemoryProvider::new();
        let (store, id) = expired_timer(&provider);
        let output = Recorder::default();

        {
            let mut controller =
                AlarmController::new(&store, output.clone(), Duration::from_secs(1), Duration::from_secs(300));
            let _ = tokio::time::timeout(Duration::from_secs(3), controller.run(&id)).await;
        }

        assert_eq!(output.calls(), vec!["play", "stop"]);
        assert!(store.contains(&id));
    }
}
