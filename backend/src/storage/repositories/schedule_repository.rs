use anyhow::{anyhow, Result};
use chrono::{NaiveDate, NaiveTime};
use sqlx::Row;

use crate::domain::models::pill::{format_date, format_time, parse_date, parse_time};
use crate::domain::models::schedule::CheckState;
use crate::storage::db::DbConnection;

/// Repository for lazily-materialized check-state rows.
///
/// Rows exist only for instances a user has viewed or toggled. Creation is
/// an atomic upsert on the (pill_id, date, time) key so two concurrent
/// first-time touches collapse into one row.
#[derive(Clone)]
pub struct ScheduleRepository {
    db: DbConnection,
}

impl ScheduleRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Materialize the row for an instance if it does not exist yet.
    pub async fn ensure_entry(&self, pill_id: i64, date: NaiveDate, time: NaiveTime) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO schedule_checks (pill_id, date, time, is_checked, checked_at)
            VALUES (?, ?, ?, 0, NULL)
            ON CONFLICT(pill_id, date, time) DO NOTHING
            "#,
        )
        .bind(pill_id)
        .bind(format_date(date))
        .bind(format_time(time))
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Set the checked flag, materializing the row on first touch.
    pub async fn set_checked(
        &self,
        pill_id: i64,
        date: NaiveDate,
        time: NaiveTime,
        checked: bool,
        checked_at: Option<&str>,
    ) -> Result<CheckState> {
        sqlx::query(
            r#"
            INSERT INTO schedule_checks (pill_id, date, time, is_checked, checked_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(pill_id, date, time)
            DO UPDATE SET is_checked = excluded.is_checked,
                          checked_at = excluded.checked_at
            "#,
        )
        .bind(pill_id)
        .bind(format_date(date))
        .bind(format_time(time))
        .bind(checked)
        .bind(checked_at)
        .execute(self.db.pool())
        .await?;

        Ok(CheckState {
            pill_id,
            date,
            time,
            is_checked: checked,
            checked_at: checked_at.map(|s| s.to_string()),
        })
    }

    /// Get the persisted state of one instance, if it was ever materialized.
    pub async fn get_state(
        &self,
        pill_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<CheckState>> {
        let row = sqlx::query(
            r#"
            SELECT pill_id, date, time, is_checked, checked_at
            FROM schedule_checks
            WHERE pill_id = ? AND date = ? AND time = ?
            "#,
        )
        .bind(pill_id)
        .bind(format_date(date))
        .bind(format_time(time))
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => {
                let time_raw: String = r.get("time");
                let date_raw: String = r.get("date");
                Ok(Some(CheckState {
                    pill_id: r.get("pill_id"),
                    date: parse_date(&date_raw)
                        .ok_or_else(|| anyhow!("bad date in schedule_checks row"))?,
                    time: parse_time(&time_raw)
                        .ok_or_else(|| anyhow!("bad time in schedule_checks row"))?,
                    is_checked: r.get("is_checked"),
                    checked_at: r.get("checked_at"),
                }))
            }
            None => Ok(None),
        }
    }

    /// All persisted states for one pill on one date, keyed by time.
    pub async fn get_states_for_pill_on(
        &self,
        pill_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<CheckState>> {
        let rows = sqlx::query(
            r#"
            SELECT pill_id, date, time, is_checked, checked_at
            FROM schedule_checks
            WHERE pill_id = ? AND date = ?
            ORDER BY time ASC
            "#,
        )
        .bind(pill_id)
        .bind(format_date(date))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter()
            .map(|r| {
                let time_raw: String = r.get("time");
                let date_raw: String = r.get("date");
                Ok(CheckState {
                    pill_id: r.get("pill_id"),
                    date: parse_date(&date_raw)
                        .ok_or_else(|| anyhow!("bad date in schedule_checks row"))?,
                    time: parse_time(&time_raw)
                        .ok_or_else(|| anyhow!("bad time in schedule_checks row"))?,
                    is_checked: r.get("is_checked"),
                    checked_at: r.get("checked_at"),
                })
            })
            .collect()
    }

    /// Row count for one pill (test support for lazy-creation behavior).
    pub async fn count_rows_for_pill(&self, pill_id: i64) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM schedule_checks WHERE pill_id = ?")
            .bind(pill_id)
            .fetch_one(self.db.pool())
            .await?;
        let count: i64 = row.get("cnt");
        Ok(count as u32)
    }
}
