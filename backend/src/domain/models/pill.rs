//! Pill domain model: the persisted definition of a medication and the
//! recurrence rule describing when it must be taken.

use chrono::{NaiveDate, NaiveTime, Weekday};

use crate::domain::errors::{DomainError, DomainResult};
use shared::{PillDto, RecurrenceRuleDto};

/// A user may hold at most this many non-stopped pills at once.
pub const MAX_ACTIVE_PILLS: u32 = 5;

/// Pill names are 1..=10 characters, counted in chars rather than bytes.
pub const MAX_PILL_NAME_CHARS: usize = 10;

/// Color tag used when the client does not pick one.
pub const DEFAULT_PILL_COLOR: &str = "#5F9DF7";

/// When a pill must be taken, as a closed variant set.
///
/// The wire format allows several rule fields at once; [`RecurrenceRule::resolve`]
/// collapses them deterministically so nothing past the boundary ever has to
/// guess which field wins.
#[derive(Debug, Clone, PartialEq)]
pub enum RecurrenceRule {
    /// Active every N days counted from the pill's start date.
    Interval { every_n_days: u32 },
    /// Active on the listed weekdays.
    Weekdays { days: Vec<Weekday> },
    /// Active only on explicitly listed dates.
    SpecificDates { dates: Vec<NaiveDate> },
}

impl RecurrenceRule {
    /// Stable storage token for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            RecurrenceRule::Interval { .. } => "interval",
            RecurrenceRule::Weekdays { .. } => "weekdays",
            RecurrenceRule::SpecificDates { .. } => "specific_dates",
        }
    }

    /// Collapse the loose wire fields into one rule.
    ///
    /// Precedence when several are present: specific dates, then weekdays,
    /// then interval. An empty list counts as absent.
    pub fn resolve(
        take_interval: Option<u32>,
        day: Option<&[String]>,
        specific: Option<&[String]>,
    ) -> DomainResult<RecurrenceRule> {
        if let Some(dates) = specific.filter(|d| !d.is_empty()) {
            let mut parsed = Vec::with_capacity(dates.len());
            for raw in dates {
                let date = parse_date(raw).ok_or(DomainError::InvalidInput("specific"))?;
                parsed.push(date);
            }
            parsed.sort();
            parsed.dedup();
            return Ok(RecurrenceRule::SpecificDates { dates: parsed });
        }

        if let Some(tokens) = day.filter(|d| !d.is_empty()) {
            let mut days = Vec::with_capacity(tokens.len());
            for token in tokens {
                let weekday = parse_weekday(token).ok_or(DomainError::InvalidInput("day"))?;
                if !days.contains(&weekday) {
                    days.push(weekday);
                }
            }
            days.sort_by_key(|d| d.num_days_from_monday());
            return Ok(RecurrenceRule::Weekdays { days });
        }

        match take_interval {
            Some(n) if n >= 1 => Ok(RecurrenceRule::Interval { every_n_days: n }),
            Some(_) => Err(DomainError::InvalidInput("take_interval")),
            None => Err(DomainError::InvalidInput("rule")),
        }
    }

    pub fn to_dto(&self) -> RecurrenceRuleDto {
        match self {
            RecurrenceRule::Interval { every_n_days } => RecurrenceRuleDto::Interval {
                every_n_days: *every_n_days,
            },
            RecurrenceRule::Weekdays { days } => RecurrenceRuleDto::Weekdays {
                days: days.iter().map(|d| weekday_token(*d).to_string()).collect(),
            },
            RecurrenceRule::SpecificDates { dates } => RecurrenceRuleDto::SpecificDates {
                dates: dates.iter().map(|d| format_date(*d)).collect(),
            },
        }
    }
}

/// A persisted pill.
#[derive(Debug, Clone, PartialEq)]
pub struct Pill {
    pub id: i64,
    /// Owning user (the take-er), which may differ from the caller who added it.
    pub user_id: i64,
    pub name: String,
    pub color: String,
    pub rule: RecurrenceRule,
    /// Times of day on an active date, kept sorted.
    pub times: Vec<NaiveTime>,
    pub start: NaiveDate,
    /// Last active date; None means "until stopped".
    pub end: Option<NaiveDate>,
    pub is_stopped: bool,
    /// First inactive date once stopped.
    pub stop_date: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

impl Pill {
    pub fn to_dto(&self) -> PillDto {
        PillDto {
            id: self.id,
            user_id: self.user_id,
            pill_name: self.name.clone(),
            color: self.color.clone(),
            rule: self.rule.to_dto(),
            time_list: self.times.iter().map(|t| format_time(*t)).collect(),
            start: format_date(self.start),
            end: self.end.map(format_date),
            is_stopped: self.is_stopped,
            stop_date: self.stop_date.map(format_date),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// Validated fields for an insert or full replacement, before ids and
/// timestamps are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct PillDraft {
    pub user_id: i64,
    pub name: String,
    pub color: String,
    pub rule: RecurrenceRule,
    pub times: Vec<NaiveTime>,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

pub fn parse_weekday(token: &str) -> Option<Weekday> {
    match token.to_ascii_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn weekday_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
