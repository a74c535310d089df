//! Recurrence expansion: the pure mapping from (pill, date) to the schedule
//! instances that exist on that date.
//!
//! No I/O happens here. The pill's date bounds are applied before the rule
//! is consulted, so a stopped pill keeps its pre-stop history intact and a
//! rule can never produce instances outside [start, end].

use chrono::{Datelike, NaiveDate, NaiveTime};

use crate::domain::models::pill::{Pill, RecurrenceRule};

/// Whether `pill` has any schedule instance on `date`.
pub fn is_active(pill: &Pill, date: NaiveDate) -> bool {
    if date < pill.start {
        return false;
    }
    if let Some(end) = pill.end {
        if date > end {
            return false;
        }
    }
    if pill.is_stopped {
        // Instances on or after the stop date cease to exist; earlier dates
        // stay queryable as history.
        match pill.stop_date {
            Some(stop) if date >= stop => return false,
            None => return false,
            _ => {}
        }
    }

    match &pill.rule {
        RecurrenceRule::Interval { every_n_days } => {
            if *every_n_days == 0 {
                // A corrupt row must not panic the expander.
                return false;
            }
            (date - pill.start).num_days() % i64::from(*every_n_days) == 0
        }
        RecurrenceRule::Weekdays { days } => days.contains(&date.weekday()),
        RecurrenceRule::SpecificDates { dates } => dates.contains(&date),
    }
}

/// The times-of-day `pill` must be taken on `date`, sorted; empty when the
/// pill is not active that day.
pub fn active_times_on(pill: &Pill, date: NaiveDate) -> Vec<NaiveTime> {
    if !is_active(pill, date) {
        return Vec::new();
    }
    let mut times = pill.times.clone();
    times.sort();
    times.dedup();
    times
}
