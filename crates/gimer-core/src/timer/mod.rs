mod alarm;
mod countdown;
mod output;
mod record;

pub use alarm::{AlarmController, AlarmOutcome, AlarmOutput};
pub use countdown::{CountdownEngine, CountdownOutcome};
pub use output::{BellAlarm, CommandAlarm, MultiAlarm};
pub use record::{
    format_hms, total_seconds, ActiveTimer, SavedTimer, TimerId, TimerRecord, DEFAULT_DESCRIPTION,
};
