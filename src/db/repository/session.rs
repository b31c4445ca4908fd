use chrono::{NaiveDateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Session Repository
// ============================================================================

pub struct SessionRepository;

impl SessionRepository {
    pub async fn create(
        pool: &SqlitePool,
        user_id: &str,
        token_hash: &str,
        expires_at: NaiveDateTime,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> AppResult<Session> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, token_hash, user_id, expires_at, ip_address, user_agent, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, token_hash, user_id, expires_at, ip_address, user_agent, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .bind(ip_address)
        .bind(user_agent)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Resolve a non-expired session by token hash, joined with its user.
    pub async fn find_active_by_hash(
        pool: &SqlitePool,
        token_hash: &str,
    ) -> AppResult<Option<CurrentSession>> {
        let now = Utc::now().naive_utc();

        let row = sqlx::query(
            r#"
            SELECT s.id AS session_id, s.expires_at,
                   u.id, u.name, u.email, u.image
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(row.map(|r| CurrentSession {
            session_id: r.get("session_id"),
            expires_at: r.get("expires_at"),
            user: SessionUser {
                id: r.get("id"),
                name: r.get("name"),
                email: r.get("email"),
                image: r.get("image"),
            },
        }))
    }

    pub async fn delete_by_hash(pool: &SqlitePool, token_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn purge_expired(pool: &SqlitePool) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().naive_utc())
            .execute(pool)
            .await
            .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::db::repository::user::tests::profile;
    use crate::db::{test_pool, UserRepository};

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() {
        let pool = test_pool().await;
        let user = UserRepository::create_from_twitter(&pool, &profile("1", "s", 0))
            .await
            .unwrap();
        let now = Utc::now().naive_utc();

        SessionRepository::create(&pool, &user.id, "live", now + Duration::days(1), None, None)
            .await
            .unwrap();
        SessionRepository::create(&pool, &user.id, "stale", now - Duration::minutes(1), None, None)
            .await
            .unwrap();

        let live = SessionRepository::find_active_by_hash(&pool, "live").await.unwrap();
        assert_eq!(live.map(|s| s.user.id), Some(user.id.clone()));
        assert!(SessionRepository::find_active_by_hash(&pool, "stale")
            .await
            .unwrap()
            .is_none());

        assert_eq!(SessionRepository::purge_expired(&pool).await.unwrap(), 1);
        assert!(SessionRepository::delete_by_hash(&pool, "live").await.unwrap());
        assert!(!SessionRepository::delete_by_hash(&pool, "live").await.unwrap());
    }
}
