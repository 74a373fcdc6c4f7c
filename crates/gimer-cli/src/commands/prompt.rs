//! Numbered selection prompts.
//!
//! The numbers come from a [`TimerIndex`] built for this invocation only.

use std::io::{BufRead, Write};

use gimer_core::{TimerId, TimerIndex, ValidationError};

/// Parse a typed selection number.
pub fn parse_selection(input: &str) -> Option<usize> {
    input.trim().parse::<usize>().ok()
}

/// Map a typed line to the ID it numbers in `index`.
pub fn resolve_selection(index: &TimerIndex, input: &str) -> Result<TimerId, ValidationError> {
    let number = parse_selection(input).ok_or(ValidationError::InvalidSelection)?;
    index
        .resolve(number)
        .cloned()
        .ok_or(ValidationError::UnknownIndex(number))
}

/// Ask for a number on stdin and resolve it against `index`.
///
/// Invalid or unknown input is reported to the user and yields `None`.
pub fn select(index: &TimerIndex, action: &str) -> Result<Option<TimerId>, Box<dyn std::error::Error>> {
    print!("Enter the number of the timer to {action}: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;

    match resolve_selection(index, &input) {
        Ok(id) => Ok(Some(id)),
        Err(e) => {
            println!("{e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_selection_trims_newline() {
        assert_eq!(parse_selection("2\n"), Some(2));
        assert_eq!(parse_selection("  7 \r\n"), Some(7));
    }

    #[test]
    fn parse_selection_rejects_garbage() {
        assert_eq!(parse_selection("two"), None);
        assert_eq!(parse_selection("-1"), None);
        assert_eq!(parse_selection(""), None);
    }

    fn index_of(ids: &[&str]) -> TimerIndex {
        let store: gimer_core::TimerStore<gimer_core::SavedTimer, _> =
            gimer_core::TimerStore::open(gimer_core::MemoryProvider::new(), true).unwrap();
        for id in ids {
            let mut saved = gimer_core::SavedTimer::new(*id, 60);
            saved.id = TimerId::from(*id);
            store.upsert(saved).unwrap();
        }
        store.index()
    }

    #[test]
    fn resolve_selection_maps_number_to_id() {
        let index = index_of(&["a", "b"]);
        assert_eq!(resolve_selection(&index, "2\n"), Ok(TimerId::from("b")));
    }

    #[test]
    fn resolve_selection_reports_unknown_index() {
        let index = index_of(&["a"]);
        let err = resolve_selection(&index, "9\n").unwrap_err();
        assert_eq!(err, ValidationError::UnknownIndex(9));
        assert_eq!(err.to_string(), "Timer with index 9 not found.");
        assert_eq!(resolve_selection(&index, "0"), Err(ValidationError::UnknownIndex(0)));
    }

    #[test]
    fn resolve_selection_reports_garbage() {
        let index = index_of(&["a"]);
        assert_eq!(resolve_selection(&index, "one"), Err(ValidationError::InvalidSelection));
    }
}
