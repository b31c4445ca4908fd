use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::error::{AppError, AppResult};
use crate::marketplace::encode_categories;

const SPONSOR_COLUMNS: &str = r#"
    id, user_id, status, company_name, company_website, industry, categories,
    budget_min, budget_max, looking_for, created_at, updated_at
"#;

// ============================================================================
// Sponsor Profile Repository
// ============================================================================

pub struct SponsorProfileRepository;

impl SponsorProfileRepository {
    pub async fn find_by_user_id(pool: &SqlitePool, user_id: &str) -> AppResult<Option<SponsorProfile>> {
        sqlx::query_as::<_, SponsorProfile>(&format!(
            "SELECT {} FROM sponsor_profiles WHERE user_id = ?",
            SPONSOR_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<SponsorProfile>> {
        sqlx::query_as::<_, SponsorProfile>(&format!(
            "SELECT {} FROM sponsor_profiles",
            SPONSOR_COLUMNS
        ))
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn insert_if_absent(
        pool: &SqlitePool,
        user_id: &str,
        values: &UpdateSponsorProfile,
    ) -> AppResult<bool> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            INSERT INTO sponsor_profiles (
                id, user_id, status, company_name, company_website, industry, categories,
                budget_min, budget_max, looking_for, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(values.status.map(|s| s.as_str()))
        .bind(&values.company_name)
        .bind(&values.company_website)
        .bind(&values.industry)
        .bind(values.categories.as_deref().map(encode_categories))
        .bind(values.budget_min)
        .bind(values.budget_max)
        .bind(&values.looking_for)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Same single-statement merge as the creator side, guarding the budget range.
    pub async fn update(
        pool: &SqlitePool,
        user_id: &str,
        update: UpdateSponsorProfile,
    ) -> AppResult<SponsorProfile> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, SponsorProfile>(&format!(
            r#"
            INSERT INTO sponsor_profiles (
                id, user_id, status, company_name, company_website, industry, categories,
                budget_min, budget_max, looking_for, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE
            SET status = COALESCE(excluded.status, sponsor_profiles.status),
                company_name = COALESCE(excluded.company_name, sponsor_profiles.company_name),
                company_website = COALESCE(excluded.company_website, sponsor_profiles.company_website),
                industry = COALESCE(excluded.industry, sponsor_profiles.industry),
                categories = COALESCE(excluded.categories, sponsor_profiles.categories),
                budget_min = COALESCE(excluded.budget_min, sponsor_profiles.budget_min),
                budget_max = COALESCE(excluded.budget_max, sponsor_profiles.budget_max),
                looking_for = COALESCE(excluded.looking_for, sponsor_profiles.looking_for),
                updated_at = excluded.updated_at
            WHERE COALESCE(excluded.budget_min, sponsor_profiles.budget_min) IS NULL
               OR COALESCE(excluded.budget_max, sponsor_profiles.budget_max) IS NULL
               OR COALESCE(excluded.budget_min, sponsor_profiles.budget_min)
                  <= COALESCE(excluded.budget_max, sponsor_profiles.budget_max)
            RETURNING {}
            "#,
            SPONSOR_COLUMNS
        ))
        .bind(&id)
        .bind(user_id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.company_name)
        .bind(update.company_website)
        .bind(update.industry)
        .bind(update.categories.as_deref().map(encode_categories))
        .bind(update.budget_min)
        .bind(update.budget_max)
        .bind(update.looking_for)
        .bind(now)
        .bind(now)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::Validation("budgetMin cannot be greater than budgetMax".to_string()))
    }
}
