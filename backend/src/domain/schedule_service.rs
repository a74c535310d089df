//! Schedule materialization: merges recurrence expansion with persisted
//! check-state to produce day checklists and month calendars, and hosts the
//! idempotent check/uncheck toggles.

use chrono::{NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::pill::format_date;
use crate::domain::models::schedule::{CheckState, ScheduleEntry};
use crate::domain::recurrence;
use crate::domain::user_service::UserService;
use crate::storage::{DbConnection, PillRepository, ScheduleRepository};
use shared::{CalendarDayDto, CalendarMonthResponse};

/// Service that materializes schedules on demand
#[derive(Clone)]
pub struct ScheduleService {
    pill_repository: PillRepository,
    schedule_repository: ScheduleRepository,
    user_service: UserService,
}

impl ScheduleService {
    pub fn new(db: DbConnection) -> Self {
        Self {
            pill_repository: PillRepository::new(db.clone()),
            schedule_repository: ScheduleRepository::new(db.clone()),
            user_service: UserService::new(db),
        }
    }

    /// Full checklist for one date: one entry per (active pill, time),
    /// each carrying its persisted checked state. Viewing materializes
    /// missing check rows.
    pub async fn day_schedule(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> DomainResult<Vec<ScheduleEntry>> {
        info!("Day schedule for user {} on {}", user_id, date);

        self.user_service.ensure_user_exists(user_id).await?;

        // Stopped pills are not filtered out here: the expander's stop-date
        // bound keeps pre-stop history visible and hides everything after.
        let pills = self.pill_repository.list_pills_by_user(user_id).await?;

        let mut entries = Vec::new();
        for pill in &pills {
            let times = recurrence::active_times_on(pill, date);
            if times.is_empty() {
                continue;
            }

            let states: HashMap<NaiveTime, CheckState> = self
                .schedule_repository
                .get_states_for_pill_on(pill.id, date)
                .await?
                .into_iter()
                .map(|s| (s.time, s))
                .collect();

            for time in times {
                let state = match states.get(&time) {
                    Some(state) => state.clone(),
                    None => {
                        // First view of this instance: materialize its row.
                        self.schedule_repository
                            .ensure_entry(pill.id, date, time)
                            .await?;
                        CheckState::unchecked(pill.id, date, time)
                    }
                };

                entries.push(ScheduleEntry {
                    pill_id: pill.id,
                    pill_name: pill.name.clone(),
                    color: pill.color.clone(),
                    date,
                    time,
                    is_checked: state.is_checked,
                    checked_at: state.checked_at,
                });
            }
        }

        entries.sort_by(|a, b| (a.time, a.pill_id).cmp(&(b.time, b.pill_id)));
        Ok(entries)
    }

    /// Month summary for calendar dots: one boolean per date, no per-time
    /// expansion and no row materialization.
    pub async fn month_calendar(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> DomainResult<CalendarMonthResponse> {
        info!("Month calendar for user {} in {}-{:02}", user_id, year, month);

        if !(1..=12).contains(&month) {
            return Err(DomainError::InvalidInput("date"));
        }
        self.user_service.ensure_user_exists(user_id).await?;

        let pills = self.pill_repository.list_pills_by_user(user_id).await?;

        let mut days = Vec::new();
        for day in 1..=days_in_month(year, month) {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or(DomainError::InvalidInput("date"))?;
            let has_schedule = pills.iter().any(|p| recurrence::is_active(p, date));
            days.push(CalendarDayDto {
                date: format_date(date),
                has_schedule,
            });
        }

        Ok(CalendarMonthResponse { year, month, days })
    }

    /// Day checklist for a linked member.
    pub async fn member_day_schedule(
        &self,
        caller_id: i64,
        member_id: i64,
        date: NaiveDate,
    ) -> DomainResult<Vec<ScheduleEntry>> {
        self.user_service.ensure_user_exists(member_id).await?;
        self.user_service
            .ensure_member_link(caller_id, member_id)
            .await?;
        self.day_schedule(member_id, date).await
    }

    /// Month calendar for a linked member.
    pub async fn member_month_calendar(
        &self,
        caller_id: i64,
        member_id: i64,
        year: i32,
        month: u32,
    ) -> DomainResult<CalendarMonthResponse> {
        self.user_service.ensure_user_exists(member_id).await?;
        self.user_service
            .ensure_member_link(caller_id, member_id)
            .await?;
        self.month_calendar(member_id, year, month).await
    }

    /// Mark one schedule instance taken. Idempotent: re-checking a checked
    /// instance succeeds and leaves it checked.
    pub async fn check(
        &self,
        caller_id: i64,
        pill_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> DomainResult<CheckState> {
        let state = self
            .toggle(caller_id, pill_id, date, time, true)
            .await?;
        Ok(state)
    }

    /// Mark one schedule instance not taken. Idempotent.
    pub async fn uncheck(
        &self,
        caller_id: i64,
        pill_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> DomainResult<CheckState> {
        let state = self
            .toggle(caller_id, pill_id, date, time, false)
            .await?;
        Ok(state)
    }

    async fn toggle(
        &self,
        caller_id: i64,
        pill_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        checked: bool,
    ) -> DomainResult<CheckState> {
        info!(
            "User {} setting pill {} on {} {} to checked={}",
            caller_id, pill_id, date, time, checked
        );

        let pill = self
            .pill_repository
            .get_pill(pill_id)
            .await?
            .ok_or(DomainError::NonExistentPill)?;

        if !self.user_service.can_access(caller_id, pill.user_id).await? {
            return Err(DomainError::NoPillUser);
        }

        // The instance must actually exist for this (pill, date, time);
        // out-of-range toggles never materialize rows.
        if !recurrence::active_times_on(&pill, date).contains(&time) {
            return Err(DomainError::NonExistentSchedule);
        }

        let checked_at = checked.then(|| Utc::now().to_rfc3339());
        let state = self
            .schedule_repository
            .set_checked(pill_id, date, time, checked, checked_at.as_deref())
            .await?;
        Ok(state)
    }
}

/// Days in a month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Parse a calendar query parameter: "YYYY-MM" or any "YYYY-MM-..." prefix.
pub fn parse_month_param(raw: &str) -> Option<(i32, u32)> {
    let mut parts = raw.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::user::User;
    use crate::domain::pill_service::PillService;
    use shared::CreatePillRequest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn weekday_pill(name: &str, days: &[&str]) -> CreatePillRequest {
        CreatePillRequest {
            pill_name: name.to_string(),
            color: None,
            take_interval: None,
            day: Some(days.iter().map(|d| d.to_string()).collect()),
            specific: None,
            time_list: vec!["08:00".to_string(), "20:00".to_string()],
            start: "2024-01-01".to_string(),
            end: None,
        }
    }

    struct Fixture {
        pills: PillService,
        schedules: ScheduleService,
        users: UserService,
        user: User,
    }

    async fn setup() -> Fixture {
        let db = DbConnection::init_test().await.expect("test db");
        let users = UserService::new(db.clone());
        let user = users.create_user("minji").await.unwrap();
        Fixture {
            pills: PillService::new(db.clone()),
            schedules: ScheduleService::new(db),
            users,
            user,
        }
    }

    #[tokio::test]
    async fn test_monday_wednesday_pill_day_views() {
        let f = setup().await;
        f.pills
            .add_pill(f.user.id, &weekday_pill("vitamin", &["mon", "wed"]))
            .await
            .unwrap();

        // 2024-01-01 is a Monday: two entries, both unchecked
        let monday = f.schedules.day_schedule(f.user.id, date(2024, 1, 1)).await.unwrap();
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[0].time, time(8, 0));
        assert_eq!(monday[1].time, time(20, 0));
        assert!(monday.iter().all(|e| !e.is_checked));

        // Tuesday: nothing
        let tuesday = f.schedules.day_schedule(f.user.id, date(2024, 1, 2)).await.unwrap();
        assert!(tuesday.is_empty());
    }

    #[tokio::test]
    async fn test_day_view_materializes_rows_lazily() {
        let f = setup().await;
        let pill = f
            .pills
            .add_pill(f.user.id, &weekday_pill("vitamin", &["mon"]))
            .await
            .unwrap();

        // No rows exist until the first view
        let before = f
            .schedules
            .schedule_repository
            .count_rows_for_pill(pill.id)
            .await
            .unwrap();
        assert_eq!(before, 0);

        f.schedules.day_schedule(f.user.id, date(2024, 1, 1)).await.unwrap();

        let after = f
            .schedules
            .schedule_repository
            .count_rows_for_pill(pill.id)
            .await
            .unwrap();
        assert_eq!(after, 2);
    }

    #[tokio::test]
    async fn test_check_is_idempotent_and_uncheck_restores() {
        let f = setup().await;
        let pill = f
            .pills
            .add_pill(f.user.id, &weekday_pill("vitamin", &["mon"]))
            .await
            .unwrap();
        let d = date(2024, 1, 1);
        let t = time(8, 0);

        let once = f.schedules.check(f.user.id, pill.id, d, t).await.unwrap();
        assert!(once.is_checked);

        let twice = f.schedules.check(f.user.id, pill.id, d, t).await.unwrap();
        assert!(twice.is_checked);

        let rows = f
            .schedules
            .schedule_repository
            .count_rows_for_pill(pill.id)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let reverted = f.schedules.uncheck(f.user.id, pill.id, d, t).await.unwrap();
        assert!(!reverted.is_checked);
        assert!(reverted.checked_at.is_none());
    }

    #[tokio::test]
    async fn test_checking_an_inactive_instance_fails() {
        let f = setup().await;
        let pill = f
            .pills
            .add_pill(f.user.id, &weekday_pill("vitamin", &["mon"]))
            .await
            .unwrap();

        // Tuesday is not an active day
        let wrong_day = f
            .schedules
            .check(f.user.id, pill.id, date(2024, 1, 2), time(8, 0))
            .await;
        assert!(matches!(wrong_day, Err(DomainError::NonExistentSchedule)));

        // Monday at a time the pill does not have
        let wrong_time = f
            .schedules
            .check(f.user.id, pill.id, date(2024, 1, 1), time(12, 0))
            .await;
        assert!(matches!(wrong_time, Err(DomainError::NonExistentSchedule)));

        let unknown_pill = f
            .schedules
            .check(f.user.id, 999, date(2024, 1, 1), time(8, 0))
            .await;
        assert!(matches!(unknown_pill, Err(DomainError::NonExistentPill)));
    }

    #[tokio::test]
    async fn test_checked_state_survives_later_views() {
        let f = setup().await;
        let pill = f
            .pills
            .add_pill(f.user.id, &weekday_pill("vitamin", &["mon"]))
            .await
            .unwrap();
        let d = date(2024, 1, 1);

        f.schedules.check(f.user.id, pill.id, d, time(8, 0)).await.unwrap();

        let entries = f.schedules.day_schedule(f.user.id, d).await.unwrap();
        let eight = entries.iter().find(|e| e.time == time(8, 0)).unwrap();
        let twenty = entries.iter().find(|e| e.time == time(20, 0)).unwrap();
        assert!(eight.is_checked);
        assert!(eight.checked_at.is_some());
        assert!(!twenty.is_checked);
    }

    #[tokio::test]
    async fn test_month_calendar_marks_active_days_only() {
        let f = setup().await;
        f.pills
            .add_pill(f.user.id, &weekday_pill("vitamin", &["mon"]))
            .await
            .unwrap();

        let calendar = f.schedules.month_calendar(f.user.id, 2024, 1).await.unwrap();
        assert_eq!(calendar.days.len(), 31);

        // Mondays in January 2024: 1, 8, 15, 22, 29
        for (index, day) in calendar.days.iter().enumerate() {
            let day_of_month = index as u32 + 1;
            let expected = matches!(day_of_month, 1 | 8 | 15 | 22 | 29);
            assert_eq!(day.has_schedule, expected, "day {}", day_of_month);
        }
    }

    #[tokio::test]
    async fn test_stopped_pill_history_stays_visible() {
        let f = setup().await;
        let pill = f
            .pills
            .add_pill(f.user.id, &weekday_pill("vitamin", &["mon"]))
            .await
            .unwrap();

        f.pills
            .stop_pill(f.user.id, pill.id, date(2024, 1, 10))
            .await
            .unwrap();

        // Before the stop date: still on the checklist
        let history = f.schedules.day_schedule(f.user.id, date(2024, 1, 8)).await.unwrap();
        assert_eq!(history.len(), 2);

        // On/after the stop date: gone
        let after = f.schedules.day_schedule(f.user.id, date(2024, 1, 15)).await.unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_modify_leaves_persisted_history_untouched() {
        let f = setup().await;
        let pill = f
            .pills
            .add_pill(f.user.id, &weekday_pill("vitamin", &["mon"]))
            .await
            .unwrap();
        let d = date(2024, 1, 1);
        let t = time(8, 0);

        f.schedules.check(f.user.id, pill.id, d, t).await.unwrap();

        // Replace the rule entirely; the already-recorded check must survive.
        f.pills
            .modify_pill(
                f.user.id,
                pill.id,
                &shared::ModifyPillRequest {
                    pill_name: "vitamin".to_string(),
                    color: None,
                    take_interval: None,
                    day: Some(vec!["tue".to_string()]),
                    specific: None,
                    time_list: vec!["09:00".to_string()],
                    start: "2024-01-01".to_string(),
                    end: None,
                },
            )
            .await
            .unwrap();

        let state = f
            .schedules
            .schedule_repository
            .get_state(pill.id, d, t)
            .await
            .unwrap()
            .unwrap();
        assert!(state.is_checked);
    }

    #[tokio::test]
    async fn test_member_views_require_a_link() {
        let f = setup().await;
        let dependent = f.users.create_user("grandma").await.unwrap();
        f.pills
            .add_pill(dependent.id, &weekday_pill("heart", &["mon"]))
            .await
            .unwrap();

        let denied = f
            .schedules
            .member_day_schedule(f.user.id, dependent.id, date(2024, 1, 1))
            .await;
        assert!(matches!(denied, Err(DomainError::NoMember)));

        f.users
            .add_member(f.user.id, dependent.id, "grandma")
            .await
            .unwrap();

        let via_link = f
            .schedules
            .member_day_schedule(f.user.id, dependent.id, date(2024, 1, 1))
            .await
            .unwrap();
        let direct = f
            .schedules
            .day_schedule(dependent.id, date(2024, 1, 1))
            .await
            .unwrap();
        assert_eq!(via_link, direct);

        let calendar = f
            .schedules
            .member_month_calendar(f.user.id, dependent.id, 2024, 1)
            .await
            .unwrap();
        assert!(calendar.days[0].has_schedule);
    }

    #[tokio::test]
    async fn test_member_views_check_existence_before_link() {
        let f = setup().await;
        let result = f
            .schedules
            .member_day_schedule(f.user.id, 999, date(2024, 1, 1))
            .await;
        assert!(matches!(result, Err(DomainError::NonExistentUser)));
    }

    #[tokio::test]
    async fn test_unknown_user_day_schedule_fails() {
        let f = setup().await;
        let result = f.schedules.day_schedule(999, date(2024, 1, 1)).await;
        assert!(matches!(result, Err(DomainError::NonExistentUser)));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), 31);
        assert_eq!(days_in_month(2025, 4), 30);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
    }

    #[test]
    fn test_is_leap_year() {
        assert!(!is_leap_year(2025));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
    }

    #[test]
    fn test_parse_month_param() {
        assert_eq!(parse_month_param("2024-01"), Some((2024, 1)));
        assert_eq!(parse_month_param("2024-1"), Some((2024, 1)));
        assert_eq!(parse_month_param("2024-01-15"), Some((2024, 1)));
        assert_eq!(parse_month_param("2024-13"), None);
        assert_eq!(parse_month_param("nonsense"), None);
    }
}
