use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::pill::{
    format_date, format_time, parse_date, parse_time, parse_weekday, weekday_token, Pill,
    PillDraft, RecurrenceRule,
};
use crate::storage::db::DbConnection;

/// Repository for pill rows.
///
/// The recurrence rule is stored as a kind discriminator plus one populated
/// payload column; the other payload columns stay NULL.
#[derive(Clone)]
pub struct PillRepository {
    db: DbConnection,
}

impl PillRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Insert a pill and return it with its assigned id.
    pub async fn store_pill(&self, draft: &PillDraft) -> Result<Pill> {
        let now = Utc::now().to_rfc3339();
        let (interval_days, weekdays, specific_dates) = encode_rule(&draft.rule);

        let result = sqlx::query(
            r#"
            INSERT INTO pills
                (user_id, pill_name, color, rule_kind, interval_days, weekdays,
                 specific_dates, time_list, start_date, end_date,
                 is_stopped, stop_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, ?, ?)
            "#,
        )
        .bind(draft.user_id)
        .bind(&draft.name)
        .bind(&draft.color)
        .bind(draft.rule.kind())
        .bind(interval_days)
        .bind(&weekdays)
        .bind(&specific_dates)
        .bind(encode_times(&draft.times))
        .bind(format_date(draft.start))
        .bind(draft.end.map(format_date))
        .bind(&now)
        .bind(&now)
        .execute(self.db.pool())
        .await?;

        Ok(Pill {
            id: result.last_insert_rowid(),
            user_id: draft.user_id,
            name: draft.name.clone(),
            color: draft.color.clone(),
            rule: draft.rule.clone(),
            times: draft.times.clone(),
            start: draft.start,
            end: draft.end,
            is_stopped: false,
            stop_date: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a pill by ID
    pub async fn get_pill(&self, pill_id: i64) -> Result<Option<Pill>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, pill_name, color, rule_kind, interval_days,
                   weekdays, specific_dates, time_list, start_date, end_date,
                   is_stopped, stop_date, created_at, updated_at
            FROM pills
            WHERE id = ?
            "#,
        )
        .bind(pill_id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_pill(&r)?)),
            None => Ok(None),
        }
    }

    /// List all pills owned by a user, oldest first.
    pub async fn list_pills_by_user(&self, user_id: i64) -> Result<Vec<Pill>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, pill_name, color, rule_kind, interval_days,
                   weekdays, specific_dates, time_list, start_date, end_date,
                   is_stopped, stop_date, created_at, updated_at
            FROM pills
            WHERE user_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(row_to_pill).collect()
    }

    /// Count the user's non-stopped pills (the creation-time limit input).
    pub async fn count_active_pills(&self, user_id: i64) -> Result<u32> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt
            FROM pills
            WHERE user_id = ? AND is_stopped = 0
            "#,
        )
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        let count: i64 = row.get("cnt");
        Ok(count as u32)
    }

    /// Replace a pill's definition fields in one statement.
    ///
    /// Check-state rows are keyed independently and are not touched, which is
    /// what keeps pre-modification history stable.
    pub async fn update_pill(&self, pill_id: i64, draft: &PillDraft) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let (interval_days, weekdays, specific_dates) = encode_rule(&draft.rule);

        sqlx::query(
            r#"
            UPDATE pills
            SET pill_name = ?, color = ?, rule_kind = ?, interval_days = ?,
                weekdays = ?, specific_dates = ?, time_list = ?,
                start_date = ?, end_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.color)
        .bind(draft.rule.kind())
        .bind(interval_days)
        .bind(&weekdays)
        .bind(&specific_dates)
        .bind(encode_times(&draft.times))
        .bind(format_date(draft.start))
        .bind(draft.end.map(format_date))
        .bind(&now)
        .bind(pill_id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Mark a pill stopped from `stop_date` forward.
    pub async fn stop_pill(&self, pill_id: i64, stop_date: chrono::NaiveDate) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE pills
            SET is_stopped = 1, stop_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(format_date(stop_date))
        .bind(&now)
        .bind(pill_id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Hard-delete a pill and its check-state rows in one transaction.
    pub async fn delete_pill(&self, pill_id: i64) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM schedule_checks WHERE pill_id = ?")
            .bind(pill_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM pills WHERE id = ?")
            .bind(pill_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Total pill rows for a user, including stopped ones (test support).
    pub async fn count_all_pills(&self, user_id: i64) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM pills WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.db.pool())
            .await?;
        let count: i64 = row.get("cnt");
        Ok(count as u32)
    }
}

fn encode_rule(rule: &RecurrenceRule) -> (Option<i64>, Option<String>, Option<String>) {
    match rule {
        RecurrenceRule::Interval { every_n_days } => (Some(i64::from(*every_n_days)), None, None),
        RecurrenceRule::Weekdays { days } => {
            let tokens: Vec<&str> = days.iter().map(|d| weekday_token(*d)).collect();
            (None, Some(tokens.join(",")), None)
        }
        RecurrenceRule::SpecificDates { dates } => {
            let tokens: Vec<String> = dates.iter().map(|d| format_date(*d)).collect();
            (None, None, Some(tokens.join(",")))
        }
    }
}

fn decode_rule(
    kind: &str,
    interval_days: Option<i64>,
    weekdays: Option<&str>,
    specific_dates: Option<&str>,
) -> Result<RecurrenceRule> {
    match kind {
        "interval" => {
            let n = interval_days.ok_or_else(|| anyhow!("interval pill row missing interval_days"))?;
            Ok(RecurrenceRule::Interval {
                every_n_days: u32::try_from(n)
                    .map_err(|_| anyhow!("negative interval_days in pill row"))?,
            })
        }
        "weekdays" => {
            let raw = weekdays.ok_or_else(|| anyhow!("weekday pill row missing weekdays"))?;
            let days = raw
                .split(',')
                .map(|t| parse_weekday(t).ok_or_else(|| anyhow!("bad weekday token {:?}", t)))
                .collect::<Result<Vec<_>>>()?;
            Ok(RecurrenceRule::Weekdays { days })
        }
        "specific_dates" => {
            let raw =
                specific_dates.ok_or_else(|| anyhow!("specific pill row missing specific_dates"))?;
            let dates = raw
                .split(',')
                .map(|t| parse_date(t).ok_or_else(|| anyhow!("bad date token {:?}", t)))
                .collect::<Result<Vec<_>>>()?;
            Ok(RecurrenceRule::SpecificDates { dates })
        }
        other => Err(anyhow!("unknown rule_kind {:?}", other)),
    }
}

fn encode_times(times: &[chrono::NaiveTime]) -> String {
    let tokens: Vec<String> = times.iter().map(|t| format_time(*t)).collect();
    tokens.join(",")
}

fn decode_times(raw: &str) -> Result<Vec<chrono::NaiveTime>> {
    raw.split(',')
        .map(|t| parse_time(t).ok_or_else(|| anyhow!("bad time token {:?}", t)))
        .collect()
}

fn row_to_pill(row: &SqliteRow) -> Result<Pill> {
    let weekdays: Option<String> = row.get("weekdays");
    let specific_dates: Option<String> = row.get("specific_dates");
    let rule = decode_rule(
        row.get("rule_kind"),
        row.get("interval_days"),
        weekdays.as_deref(),
        specific_dates.as_deref(),
    )?;

    let start_raw: String = row.get("start_date");
    let start = parse_date(&start_raw).ok_or_else(|| anyhow!("bad start_date in pill row"))?;

    let end_raw: Option<String> = row.get("end_date");
    let end = match end_raw {
        Some(raw) => Some(parse_date(&raw).ok_or_else(|| anyhow!("bad end_date in pill row"))?),
        None => None,
    };

    let stop_raw: Option<String> = row.get("stop_date");
    let stop_date = match stop_raw {
        Some(raw) => Some(parse_date(&raw).ok_or_else(|| anyhow!("bad stop_date in pill row"))?),
        None => None,
    };

    let time_raw: String = row.get("time_list");

    Ok(Pill {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("pill_name"),
        color: row.get("color"),
        rule,
        times: decode_times(&time_raw)?,
        start,
        end,
        is_stopped: row.get("is_stopped"),
        stop_date,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Weekday};

    fn draft(user_id: i64, rule: RecurrenceRule) -> PillDraft {
        PillDraft {
            user_id,
            name: "omega 3".to_string(),
            color: "#F2A7B3".to_string(),
            rule,
            times: vec![
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            ],
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: None,
        }
    }

    async fn setup() -> PillRepository {
        let db = DbConnection::init_test().await.expect("test db");
        PillRepository::new(db)
    }

    #[tokio::test]
    async fn test_store_and_get_round_trips_every_rule_kind() {
        let repo = setup().await;

        let rules = [
            RecurrenceRule::Interval { every_n_days: 3 },
            RecurrenceRule::Weekdays {
                days: vec![Weekday::Mon, Weekday::Wed],
            },
            RecurrenceRule::SpecificDates {
                dates: vec![
                    NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                ],
            },
        ];

        for rule in rules {
            let stored = repo.store_pill(&draft(1, rule.clone())).await.expect("store");
            let fetched = repo
                .get_pill(stored.id)
                .await
                .expect("get")
                .expect("present");
            assert_eq!(fetched.rule, rule);
            assert_eq!(fetched.times, stored.times);
            assert!(!fetched.is_stopped);
        }
    }

    #[tokio::test]
    async fn test_count_active_ignores_stopped_pills() {
        let repo = setup().await;

        let first = repo
            .store_pill(&draft(7, RecurrenceRule::Interval { every_n_days: 1 }))
            .await
            .unwrap();
        repo.store_pill(&draft(7, RecurrenceRule::Interval { every_n_days: 1 }))
            .await
            .unwrap();

        assert_eq!(repo.count_active_pills(7).await.unwrap(), 2);

        repo.stop_pill(first.id, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
            .await
            .unwrap();

        assert_eq!(repo.count_active_pills(7).await.unwrap(), 1);
        assert_eq!(repo.count_all_pills(7).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_definition() {
        let repo = setup().await;
        let stored = repo
            .store_pill(&draft(1, RecurrenceRule::Interval { every_n_days: 1 }))
            .await
            .unwrap();

        let mut replacement = draft(1, RecurrenceRule::Weekdays {
            days: vec![Weekday::Fri],
        });
        replacement.name = "iron".to_string();
        replacement.end = Some(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());

        repo.update_pill(stored.id, &replacement).await.unwrap();

        let fetched = repo.get_pill(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "iron");
        assert_eq!(
            fetched.rule,
            RecurrenceRule::Weekdays {
                days: vec![Weekday::Fri]
            }
        );
        assert_eq!(fetched.end, Some(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
        // Stop state untouched by a definition update
        assert!(!fetched.is_stopped);
    }

    #[tokio::test]
    async fn test_delete_removes_pill_and_check_rows() {
        let repo = setup().await;
        let stored = repo
            .store_pill(&draft(1, RecurrenceRule::Interval { every_n_days: 1 }))
            .await
            .unwrap();

        sqlx::query(
            "INSERT INTO schedule_checks (pill_id, date, time, is_checked) VALUES (?, ?, ?, 1)",
        )
        .bind(stored.id)
        .bind("2024-01-01")
        .bind("08:00")
        .execute(repo.db.pool())
        .await
        .unwrap();

        repo.delete_pill(stored.id).await.unwrap();

        assert!(repo.get_pill(stored.id).await.unwrap().is_none());
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM schedule_checks WHERE pill_id = ?")
            .bind(stored.id)
            .fetch_one(repo.db.pool())
            .await
            .unwrap();
        let count: i64 = row.get("cnt");
        assert_eq!(count, 0);
    }
}
