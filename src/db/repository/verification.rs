use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Verification Repository
// ============================================================================

pub struct VerificationRepository;

impl VerificationRepository {
    pub async fn create(
        pool: &SqlitePool,
        identifier: &str,
        value: &str,
        expires_at: NaiveDateTime,
    ) -> AppResult<()> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO verifications (id, identifier, value, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (identifier) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&id)
        .bind(identifier)
        .bind(value)
        .bind(expires_at)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    /// Take the value for `identifier`, deleting it. Expired entries yield `None`.
    pub async fn consume(pool: &SqlitePool, identifier: &str) -> AppResult<Option<String>> {
        let row = sqlx::query_as::<_, Verification>(
            r#"
            DELETE FROM verifications
            WHERE identifier = ?
            RETURNING id, identifier, value, expires_at, created_at
            "#,
        )
        .bind(identifier)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        let now = Utc::now().naive_utc();
        Ok(row.filter(|v| v.expires_at > now).map(|v| v.value))
    }

    pub async fn purge_expired(pool: &SqlitePool) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM verifications WHERE expires_at <= ?")
            .bind(Utc::now().naive_utc())
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}
