//! # gimer Core Library
//!
//! Named countdown timers shared between short-lived CLI processes. There is
//! no daemon: every invocation rebuilds its view of the timers from the
//! per-user data directory, and the persisted collection is the only channel
//! between processes.
//!
//! ## Architecture
//!
//! - **Timer Store**: ID-keyed collection of active or saved timers, written
//!   back as a complete JSON snapshot on every mutation
//! - **Countdown Engine**: polls the store once per tick until the timer
//!   expires or its record disappears
//! - **Alarm Controller**: engages an alarm output after expiry and polls for
//!   removal, giving up after a bounded ceiling
//! - **Cancellation**: `stop` removes the record; pollers observe it on their
//!   next tick
//!
//! ## Key Components
//!
//! - [`TimerStore`]: Collection persistence and reconciliation
//! - [`CountdownEngine`] / [`AlarmController`]: The in-process state machine
//! - [`cancel`]: Stop one or all timers from any process
//! - [`Config`]: Application configuration management

pub mod cancel;
pub mod clock;
pub mod error;
pub mod session;
pub mod storage;
pub mod timer;

pub use cancel::StopOutcome;
pub use clock::{Clock, SystemClock};
pub use error::{AlarmError, ConfigError, StoreError, ValidationError};
pub use session::SessionOutcome;
pub use storage::{Config, JsonFileProvider, MemoryProvider, PersistenceProvider, TimerIndex, TimerStore};
pub use timer::{
    ActiveTimer, AlarmController, AlarmOutcome, AlarmOutput, CountdownEngine, CountdownOutcome,
    SavedTimer, TimerId, TimerRecord,
};
