//! Concrete alarm outputs.
//!
//! Every output runs its alert on a background thread and disengages on
//! [`AlarmOutput::stop`] or on drop.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use super::alarm::AlarmOutput;
use crate::error::AlarmError;
use crate::storage::AlarmConfig;

const BELL_INTERVAL: Duration = Duration::from_secs(1);
const CHILD_POLL: Duration = Duration::from_millis(100);

/// Rings the terminal bell once per second.
#[derive(Default)]
pub struct BellAlarm {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl BellAlarm {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlarmOutput for BellAlarm {
    fn name(&self) -> &str {
        "bell"
    }

    fn play(&mut self) -> Result<(), AlarmError> {
        if self.worker.is_some() {
            return Ok(());
        }
        // Fresh flag so a worker from an earlier play cannot be revived.
        self.stop = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&self.stop);
        let worker = std::thread::Builder::new()
            .name("gimer-bell".into())
            .spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    let mut err = std::io::stderr();
                    if err.write_all(b"\x07").and_then(|()| err.flush()).is_err() {
                        break;
                    }
                    std::thread::sleep(BELL_INTERVAL);
                }
            })
            .map_err(|e| AlarmError::EngageFailed {
                output: "bell".into(),
                message: e.to_string(),
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        // The worker notices within one bell interval; no need to block on it.
        self.worker.take();
    }
}

impl Drop for BellAlarm {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Replays an external player command until stopped.
pub struct CommandAlarm {
    program: String,
    args: Vec<String>,
    stop: Arc<AtomicBool>,
    child: Arc<Mutex<Option<Child>>>,
    worker: Option<JoinHandle<()>>,
}

impl CommandAlarm {
    /// Parse a shell-style command line.
    pub fn parse(command_line: &str) -> Result<Self, AlarmError> {
        let invalid = |message: &str| AlarmError::EngageFailed {
            output: command_line.to_string(),
            message: message.to_string(),
        };
        let mut words = shlex::split(command_line).ok_or_else(|| invalid("unbalanced quotes"))?;
        if words.is_empty() {
            return Err(invalid("empty command"));
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
            stop: Arc::new(AtomicBool::new(false)),
            child: Arc::new(Mutex::new(None)),
            worker: None,
        })
    }

    fn spawn(program: &str, args: &[String]) -> std::io::Result<Child> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }
}

impl AlarmOutput for CommandAlarm {
    fn name(&self) -> &str {
        &self.program
    }

    fn play(&mut self) -> Result<(), AlarmError> {
        if self.worker.is_some() {
            return Ok(());
        }
        self.stop = Arc::new(AtomicBool::new(false));

        // Spawn the first run here so a missing player is reported to the caller.
        let first = Self::spawn(&self.program, &self.args).map_err(|e| AlarmError::EngageFailed {
            output: self.program.clone(),
            message: e.to_string(),
        })?;
        *lock(&self.child) = Some(first);

        let stop = Arc::clone(&self.stop);
        let child = Arc::clone(&self.child);
        let program = self.program.clone();
        let args = self.args.clone();
        let worker = std::thread::Builder::new()
            .name("gimer-alarm-cmd".into())
            .spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    std::thread::sleep(CHILD_POLL);
                    let mut slot = lock(&child);
                    let finished = match slot.as_mut() {
                        Some(running) => !matches!(running.try_wait(), Ok(None)),
                        None => true,
                    };
                    if finished && !stop.load(Ordering::SeqCst) {
                        match Self::spawn(&program, &args) {
                            Ok(next) => *slot = Some(next),
                            Err(e) => {
                                warn!(program = %program, error = %e, "alarm command failed to respawn");
                                *slot = None;
                                break;
                            }
                        }
                    }
                }
            })
            .map_err(|e| AlarmError::EngageFailed {
                output: self.program.clone(),
                message: e.to_string(),
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(mut running) = lock(&self.child).take() {
            let _ = running.kill();
            let _ = running.wait();
            debug!(program = %self.program, "alarm command killed");
        }
        self.worker.take();
    }
}

impl Drop for CommandAlarm {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock(child: &Mutex<Option<Child>>) -> std::sync::MutexGuard<'_, Option<Child>> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fan-out over several outputs. Engaged if at least one output engages.
#[derive(Default)]
pub struct MultiAlarm {
    outputs: Vec<Box<dyn AlarmOutput>>,
}

impl MultiAlarm {
    pub fn new(outputs: Vec<Box<dyn AlarmOutput>>) -> Self {
        Self { outputs }
    }

    /// Outputs selected by the `[alarm]` config section.
    ///
    /// An unparsable command is logged and skipped.
    pub fn from_config(config: &AlarmConfig) -> Self {
        let mut outputs: Vec<Box<dyn AlarmOutput>> = Vec::new();
        if let Some(command) = config.command.as_deref() {
            match CommandAlarm::parse(command) {
                Ok(alarm) => outputs.push(Box::new(alarm)),
                Err(e) => warn!(error = %e, "ignoring alarm command"),
            }
        }
        if config.bell {
            outputs.push(Box::new(BellAlarm::new()));
        }
        Self { outputs }
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl AlarmOutput for MultiAlarm {
    fn name(&self) -> &str {
        "multi"
    }

    fn play(&mut self) -> Result<(), AlarmError> {
        let mut engaged = false;
        let mut failures = Vec::new();
        for output in &mut self.outputs {
            match output.play() {
                Ok(()) => engaged = true,
                Err(e) => failures.push(e.to_string()),
            }
        }
        if engaged {
            for failure in &failures {
                warn!(error = %failure, "alarm output failed");
            }
            return Ok(());
        }
        let message = if failures.is_empty() {
            "no alarm output configured".to_string()
        } else {
            failures.join("; ")
        };
        Err(AlarmError::EngageFailed {
            output: "multi".into(),
            message,
        })
    }

    fn stop(&mut self) {
        for output in &mut self.outputs {
            output.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl AlarmOutput for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn play(&mut self) -> Result<(), AlarmError> {
            Err(AlarmError::EngageFailed {
                output: "failing".into(),
                message: "no device".into(),
            })
        }

        fn stop(&mut self) {}
    }

    #[test]
    fn command_parse_splits_arguments() {
        let alarm = CommandAlarm::parse("paplay '/tmp/my sound.wav'").unwrap();
        assert_eq!(alarm.program, "paplay");
        assert_eq!(alarm.args, vec!["/tmp/my sound.wav".to_string()]);
    }

    #[test]
    fn command_parse_rejects_empty_and_unbalanced() {
        assert!(CommandAlarm::parse("   ").is_err());
        assert!(CommandAlarm::parse("play 'oops").is_err());
    }

    #[test]
    fn missing_player_fails_to_engage() {
        let mut alarm = CommandAlarm::parse("gimer-definitely-not-a-real-player").unwrap();
        assert!(alarm.play().is_err());
        assert!(alarm.worker.is_none());
    }

    #[test]
    fn empty_multi_alarm_fails() {
        let mut alarm = MultiAlarm::default();
        assert!(alarm.play().is_err());
    }

    #[test]
    fn multi_alarm_fails_only_when_every_output_fails() {
        let mut all_failing = MultiAlarm::new(vec![Box::new(Failing), Box::new(Failing)]);
        assert!(all_failing.play().is_err());

        let mut one_works = MultiAlarm::new(vec![Box::new(Failing), Box::new(BellAlarm::new())]);
        assert!(one_works.play().is_ok());
        one_works.stop();
    }

    #[test]
    fn from_config_selects_outputs() {
        let config = AlarmConfig {
            bell: true,
            command: Some("paplay bell.oga".into()),
            ..AlarmConfig::default()
        };
        assert_eq!(MultiAlarm::from_config(&config).len(), 2);

        let silent = AlarmConfig {
            bell: false,
            command: None,
            ..AlarmConfig::default()
        };
        assert!(MultiAlarm::from_config(&silent).is_empty());
    }

    #[test]
    fn bell_play_is_idempotent_and_stops() {
        let mut bell = BellAlarm::new();
        bell.play().unwrap();
        bell.play().unwrap();
        bell.stop();
        assert!(bell.worker.is_none());
        assert!(bell.stop.load(Ordering::SeqCst));
    }
}
