use serde::{Deserialize, Serialize};

/// Wire representation of a pill as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillDto {
    pub id: i64,
    /// ID of the user this pill belongs to (the take-er, not necessarily the caller)
    pub user_id: i64,
    pub pill_name: String,
    /// Display color tag chosen at creation time
    pub color: String,
    pub rule: RecurrenceRuleDto,
    /// Times of day the pill must be taken on an active day ("HH:MM")
    pub time_list: Vec<String>,
    /// First active date ("YYYY-MM-DD")
    pub start: String,
    /// Last active date; None means "until stopped"
    pub end: Option<String>,
    pub is_stopped: bool,
    pub stop_date: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub updated_at: String,
}

/// Recurrence rule in its resolved, unambiguous form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecurrenceRuleDto {
    /// Active every N days counted from the pill's start date
    Interval { every_n_days: u32 },
    /// Active on the listed weekdays ("mon".."sun")
    Weekdays { days: Vec<String> },
    /// Active only on the listed calendar dates ("YYYY-MM-DD")
    SpecificDates { dates: Vec<String> },
}

/// Request body for creating a pill.
///
/// The three rule fields mirror the loose wire shape clients already send;
/// when more than one is present the server resolves them with a fixed
/// precedence (specific dates, then weekdays, then interval).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePillRequest {
    pub pill_name: String,
    pub color: Option<String>,
    /// "Every N days" interval rule
    pub take_interval: Option<u32>,
    /// Weekday rule, tokens "mon".."sun"
    pub day: Option<Vec<String>>,
    /// Specific-dates rule, "YYYY-MM-DD" entries
    pub specific: Option<Vec<String>>,
    pub time_list: Vec<String>,
    pub start: String,
    pub end: Option<String>,
}

/// Request body for replacing a pill's definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifyPillRequest {
    pub pill_name: String,
    pub color: Option<String>,
    pub take_interval: Option<u32>,
    pub day: Option<Vec<String>>,
    pub specific: Option<Vec<String>>,
    pub time_list: Vec<String>,
    pub start: String,
    pub end: Option<String>,
}

/// Request body for stopping a pill from a given date forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopPillRequest {
    /// First inactive date ("YYYY-MM-DD")
    pub date: String,
}

/// How many pills a user has and how many more they may add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillCountResponse {
    pub used: u32,
    pub remaining: u32,
}

/// One (pill, date, time) occurrence on a day checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntryDto {
    pub pill_id: i64,
    pub pill_name: String,
    pub color: String,
    pub date: String,
    pub time: String,
    pub is_checked: bool,
    pub checked_at: Option<String>,
}

/// Full checklist for a single date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayScheduleResponse {
    pub date: String,
    pub schedules: Vec<ScheduleEntryDto>,
}

/// One day of the month calendar; `has_schedule` drives dot rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDayDto {
    pub date: String,
    pub has_schedule: bool,
}

/// Month summary: a boolean per date, no per-time expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarMonthResponse {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDayDto>,
}

/// Identifies one schedule instance for check/uncheck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleCheckRequest {
    pub pill_id: i64,
    pub date: String,
    pub time: String,
}

/// Check-state of one schedule instance after a toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleCheckResponse {
    pub pill_id: i64,
    pub date: String,
    pub time: String,
    pub is_checked: bool,
    pub checked_at: Option<String>,
}

/// A user this caller may view and manage schedules for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDto {
    pub member_id: i64,
    pub member_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberListResponse {
    pub members: Vec<MemberDto>,
}

/// Request body for linking a member to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub member_id: i64,
    /// Display name the caller uses for this member
    pub member_name: String,
}
