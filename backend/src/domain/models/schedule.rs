//! Schedule-instance models.
//!
//! A schedule instance is derived from a pill's rule, never pre-generated;
//! only its check-state is persisted, and that row is created lazily the
//! first time the instance is viewed or toggled.

use chrono::{NaiveDate, NaiveTime};

use crate::domain::models::pill::{format_date, format_time};
use shared::{ScheduleCheckResponse, ScheduleEntryDto};

/// Persisted check-state of one (pill, date, time) instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckState {
    pub pill_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub is_checked: bool,
    pub checked_at: Option<String>,
}

impl CheckState {
    /// Fresh unchecked state for an instance that has never been touched.
    pub fn unchecked(pill_id: i64, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            pill_id,
            date,
            time,
            is_checked: false,
            checked_at: None,
        }
    }

    pub fn to_response(&self) -> ScheduleCheckResponse {
        ScheduleCheckResponse {
            pill_id: self.pill_id,
            date: format_date(self.date),
            time: format_time(self.time),
            is_checked: self.is_checked,
            checked_at: self.checked_at.clone(),
        }
    }
}

/// One row of a day checklist: an active instance merged with its state.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub pill_id: i64,
    pub pill_name: String,
    pub color: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub is_checked: bool,
    pub checked_at: Option<String>,
}

impl ScheduleEntry {
    pub fn to_dto(&self) -> ScheduleEntryDto {
        ScheduleEntryDto {
            pill_id: self.pill_id,
            pill_name: self.pill_name.clone(),
            color: self.color.clone(),
            date: format_date(self.date),
            time: format_time(self.time),
            is_checked: self.is_checked,
            checked_at: self.checked_at.clone(),
        }
    }
}
