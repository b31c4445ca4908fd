use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};

// ============================================================================
// Account Repository
// ============================================================================

pub struct AccountRepository;

impl AccountRepository {
    pub async fn find_by_user_and_provider(
        pool: &SqlitePool,
        user_id: &str,
        provider_id: &str,
    ) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, provider_id, account_id, access_token, refresh_token,
                   access_token_expires_at, scope, created_at, updated_at
            FROM accounts
            WHERE user_id = ? AND provider_id = ?
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(provider_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Link (or relink) a provider account to a user with fresh tokens.
    pub async fn upsert(
        pool: &SqlitePool,
        user_id: &str,
        provider_id: &str,
        account_id: &str,
        tokens: &AccountTokens,
    ) -> AppResult<Account> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (
                id, user_id, provider_id, account_id,
                access_token, refresh_token, access_token_expires_at, scope,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (provider_id, account_id) DO UPDATE SET
                user_id = excluded.user_id,
                access_token = excluded.access_token,
                refresh_token = COALESCE(excluded.refresh_token, accounts.refresh_token),
                access_token_expires_at = excluded.access_token_expires_at,
                scope = COALESCE(excluded.scope, accounts.scope),
                updated_at = excluded.updated_at
            RETURNING id, user_id, provider_id, account_id, access_token, refresh_token,
                      access_token_expires_at, scope, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(provider_id)
        .bind(account_id)
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.access_token_expires_at)
        .bind(&tokens.scope)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Persist tokens obtained from a refresh. A missing refresh token keeps the stored one.
    pub async fn update_tokens(pool: &SqlitePool, id: &str, tokens: &AccountTokens) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE accounts
            SET access_token = ?,
                refresh_token = COALESCE(?, refresh_token),
                access_token_expires_at = ?,
                scope = COALESCE(?, scope),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.access_token_expires_at)
        .bind(&tokens.scope)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }
}
