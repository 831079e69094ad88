//! Permission flag repository.
//!
//! Usernames are stored exactly as given; case folding is the caller's job.

use super::DbError;
use sqlx::SqlitePool;

/// Repository for per-user flag strings.
pub struct FlagRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FlagRepository<'a> {
    /// Create a new flag repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// The stored flag string for `username`, if a row exists.
    pub async fn get(&self, username: &str) -> Result<Option<String>, DbError> {
        let flags = sqlx::query_scalar::<_, String>("SELECT flags FROM flags WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool)
            .await?;

        Ok(flags)
    }

    /// Store `flags` for `username`, creating the row if absent.
    pub async fn set(&self, username: &str, flags: &str) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO flags (username, flags) VALUES (?, ?)
            ON CONFLICT(username) DO UPDATE SET flags = excluded.flags
            "#,
        )
        .bind(username)
        .bind(flags)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
