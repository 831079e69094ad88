//! Trigger rule repository.
//!
//! Rows are returned in insertion order (`id` ascending); first-match-wins
//! matching depends on it.

use super::DbError;
use sqlx::SqlitePool;

/// A stored pattern → response rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRecord {
    pub id: i64,
    pub pattern: String,
    pub response: String,
    pub learned_by: Option<String>,
    pub created_at: i64,
}

/// Repository for trigger rules.
pub struct TriggerRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TriggerRepository<'a> {
    /// Create a new trigger repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a rule unless the identical (pattern, response) pair exists.
    ///
    /// Returns `true` if a row was inserted.
    pub async fn insert(
        &self,
        pattern: &str,
        response: &str,
        learned_by: Option<&str>,
    ) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO commands ("trigger", response, learned_by, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(pattern)
        .bind(response)
        .bind(learned_by)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every rule with this exact pattern text.
    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, DbError> {
        let result = sqlx::query(r#"DELETE FROM commands WHERE "trigger" = ?"#)
            .bind(pattern)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete every rule.
    pub async fn delete_all(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM commands")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// All rules, oldest first.
    pub async fn list(&self) -> Result<Vec<TriggerRecord>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, String, Option<String>, i64)>(
            r#"
            SELECT id, "trigger", response, learned_by, created_at
            FROM commands
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, pattern, response, learned_by, created_at)| TriggerRecord {
                    id,
                    pattern,
                    response,
                    learned_by,
                    created_at,
                },
            )
            .collect())
    }
}
