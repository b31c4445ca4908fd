use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};
use crate::marketplace::encode_categories;

const CREATOR_COLUMNS: &str = r#"
    id, user_id, status, price_min, price_max, categories, looking_for,
    contact_method, contact_value, created_at, updated_at
"#;

// ============================================================================
// Creator Profile Repository
// ============================================================================

pub struct CreatorProfileRepository;

impl CreatorProfileRepository {
    pub async fn find_by_user_id(pool: &SqlitePool, user_id: &str) -> AppResult<Option<CreatorProfile>> {
        sqlx::query_as::<_, CreatorProfile>(&format!(
            "SELECT {} FROM creator_profiles WHERE user_id = ?",
            CREATOR_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<CreatorProfile>> {
        sqlx::query_as::<_, CreatorProfile>(&format!(
            "SELECT {} FROM creator_profiles",
            CREATOR_COLUMNS
        ))
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Insert a profile unless the user already has one. Returns whether a row was written.
    pub async fn insert_if_absent(
        pool: &SqlitePool,
        user_id: &str,
        values: &UpdateCreatorProfile,
    ) -> AppResult<bool> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO creator_profiles (
                id, user_id, status, price_min, price_max, categories, looking_for,
                contact_method, contact_value, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(values.status.map(|s| s.as_str()))
        .bind(values.price_min)
        .bind(values.price_max)
        .bind(values.categories.as_deref().map(encode_categories))
        .bind(&values.looking_for)
        .bind(values.contact_method.map(|m| m.as_str()))
        .bind(&values.contact_value)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply a partial update in one upsert. Omitted fields keep their stored values, and
    /// the merged price range must stay ordered or nothing is written.
    pub async fn update(
        pool: &SqlitePool,
        user_id: &str,
        update: UpdateCreatorProfile,
    ) -> AppResult<CreatorProfile> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, CreatorProfile>(&format!(
            r#"
            INSERT INTO creator_profiles (
                id, user_id, status, price_min, price_max, categories, looking_for,
                contact_method, contact_value, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE
            SET status = COALESCE(excluded.status, creator_profiles.status),
                price_min = COALESCE(excluded.price_min, creator_profiles.price_min),
                price_max = COALESCE(excluded.price_max, creator_profiles.price_max),
                categories = COALESCE(excluded.categories, creator_profiles.categories),
                looking_for = COALESCE(excluded.looking_for, creator_profiles.looking_for),
                contact_method = COALESCE(excluded.contact_method, creator_profiles.contact_method),
                contact_value = COALESCE(excluded.contact_value, creator_profiles.contact_value),
                updated_at = excluded.updated_at
            WHERE COALESCE(excluded.price_min, creator_profiles.price_min) IS NULL
               OR COALESCE(excluded.price_max, creator_profiles.price_max) IS NULL
               OR COALESCE(excluded.price_min, creator_profiles.price_min)
                  <= COALESCE(excluded.price_max, creator_profiles.price_max)
            RETURNING {}
            "#,
            CREATOR_COLUMNS
        ))
        .bind(&id)
        .bind(user_id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.price_min)
        .bind(update.price_max)
        .bind(update.categories.as_deref().map(encode_categories))
        .bind(update.looking_for)
        .bind(update.contact_method.map(|m| m.as_str()))
        .bind(update.contact_value)
        .bind(now)
        .bind(now)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::Validation("priceMin cannot be greater than priceMax".to_string()))
    }
}
