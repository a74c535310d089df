use anyhow::Result;
use chrono::Utc;
use sqlx::Row;

use crate::domain::models::user::{MemberLink, User};
use crate::storage::db::DbConnection;

/// Repository for user rows and caregiving member links.
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    /// Store a new user and return it with its assigned id.
    pub async fn store_user(&self, username: &str) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, created_at, updated_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(&now)
        .bind(&now)
        .execute(self.db.pool())
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.pool())
        .await?;

        match row {
            Some(r) => Ok(Some(User {
                id: r.get("id"),
                username: r.get("username"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            })),
            None => Ok(None),
        }
    }

    /// Create a member link. Returns false when the link already exists.
    pub async fn store_member_link(
        &self,
        user_id: i64,
        member_id: i64,
        member_name: &str,
    ) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO members (user_id, member_id, member_name, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, member_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(member_id)
        .bind(member_name)
        .bind(&now)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether `user_id` holds a link to `member_id`.
    pub async fn has_member_link(&self, user_id: i64, member_id: i64) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present
            FROM members
            WHERE user_id = ? AND member_id = ?
            "#,
        )
        .bind(user_id)
        .bind(member_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.is_some())
    }

    /// List all members linked to a user, ordered by display name.
    pub async fn list_member_links(&self, user_id: i64) -> Result<Vec<MemberLink>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, member_id, member_name, created_at
            FROM members
            WHERE user_id = ?
            ORDER BY member_name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let links = rows
            .iter()
            .map(|row| MemberLink {
                user_id: row.get("user_id"),
                member_id: row.get("member_id"),
                member_name: row.get("member_name"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(links)
    }
}
