use sqlx::SqlitePool;

use crate::db::{
    CreatorProfile, CreatorProfileRepository, Role, SponsorProfile, SponsorProfileRepository,
    UpdateCreatorProfile, UpdateSponsorProfile, UserRepository,
};
use crate::error::{AppError, AppResult};

const MAX_TEXT_LEN: usize = 1000;
const MAX_SHORT_TEXT_LEN: usize = 255;
const MAX_CATEGORIES: usize = 20;

pub struct SettingsService;

impl SettingsService {
    fn validate_text(value: Option<&str>, field: &str, max: usize) -> AppResult<()> {
        if let Some(v) = value {
            if v.chars().count() > max {
                return Err(AppError::Validation(format!(
                    "{} cannot exceed {} characters",
                    field, max
                )));
            }
        }
        Ok(())
    }

    fn validate_amount(value: Option<i64>, field: &str) -> AppResult<()> {
        match value {
            Some(v) if v < 0 => Err(AppError::Validation(format!("{} cannot be negative", field))),
            _ => Ok(()),
        }
    }

    fn validate_categories(categories: Option<&[String]>) -> AppResult<()> {
        match categories {
            Some(c) if c.len() > MAX_CATEGORIES => Err(AppError::Validation(format!(
                "categories cannot contain more than {} entries",
                MAX_CATEGORIES
            ))),
            _ => Ok(()),
        }
    }

    /// Amounts must be non-negative, and a range given in one request must be ordered.
    pub fn validate_range(
        min: Option<i64>,
        max: Option<i64>,
        min_field: &str,
        max_field: &str,
    ) -> AppResult<()> {
        Self::validate_amount(min, min_field)?;
        Self::validate_amount(max, max_field)?;
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(AppError::Validation(format!(
                    "{} cannot be greater than {}",
                    min_field, max_field
                )));
            }
        }
        Ok(())
    }

    pub async fn set_role(pool: &SqlitePool, user_id: &str, role: Role) -> AppResult<Role> {
        UserRepository::set_role(pool, user_id, role).await?;
        tracing::info!("User {} chose role {}", user_id, role);
        Ok(role)
    }

    pub async fn update_creator_settings(
        pool: &SqlitePool,
        user_id: &str,
        update: UpdateCreatorProfile,
    ) -> AppResult<CreatorProfile> {
        Self::validate_text(update.looking_for.as_deref(), "lookingFor", MAX_TEXT_LEN)?;
        Self::validate_text(update.contact_value.as_deref(), "contactValue", MAX_SHORT_TEXT_LEN)?;
        Self::validate_categories(update.categories.as_deref())?;

        // Ordering against stored values is enforced by the upsert itself.
        Self::validate_range(update.price_min, update.price_max, "priceMin", "priceMax")?;

        CreatorProfileRepository::update(pool, user_id, update).await
    }

    pub async fn update_sponsor_settings(
        pool: &SqlitePool,
        user_id: &str,
        update: UpdateSponsorProfile,
    ) -> AppResult<SponsorProfile> {
        Self::validate_text(update.company_name.as_deref(), "companyName", MAX_SHORT_TEXT_LEN)?;
        Self::validate_text(update.company_website.as_deref(), "companyWebsite", MAX_SHORT_TEXT_LEN)?;
        Self::validate_text(update.industry.as_deref(), "industry", MAX_SHORT_TEXT_LEN)?;
        Self::validate_text(update.looking_for.as_deref(), "lookingFor", MAX_TEXT_LEN)?;
        Self::validate_categories(update.categories.as_deref())?;

        Self::validate_range(update.budget_min, update.budget_max, "budgetMin", "budgetMax")?;

        SponsorProfileRepository::update(pool, user_id, update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::user::tests::profile;
    use crate::db::{test_pool, CreatorStatus};

    async fn user(pool: &SqlitePool) -> String {
        UserRepository::create_from_twitter(pool, &profile("1", "creator", 0))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn hiding_keeps_stored_price() {
        let pool = test_pool().await;
        let user_id = user(&pool).await;
        SettingsService::update_creator_settings(
            &pool,
            &user_id,
            UpdateCreatorProfile {
                price_min: Some(500),
                status: Some(CreatorStatus::Available),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let saved = SettingsService::update_creator_settings(
            &pool,
            &user_id,
            UpdateCreatorProfile {
                status: Some(CreatorStatus::Hidden),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(saved.status, Some(CreatorStatus::Hidden));
        assert_eq!(saved.price_min, Some(500));
    }

    #[tokio::test]
    async fn merged_range_must_be_ordered() {
        let pool = test_pool().await;
        let user_id = user(&pool).await;
        SettingsService::update_creator_settings(
            &pool,
            &user_id,
            UpdateCreatorProfile {
                price_min: Some(500),
                price_max: Some(1_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = SettingsService::update_creator_settings(
            &pool,
            &user_id,
            UpdateCreatorProfile {
                price_min: Some(2_000),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let stored = CreatorProfileRepository::find_by_user_id(&pool, &user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.price_min, Some(500));
    }

    #[tokio::test]
    async fn negative_budget_is_rejected() {
        let pool = test_pool().await;
        let user_id = user(&pool).await;
        let err = SettingsService::update_sponsor_settings(
            &pool,
            &user_id,
            UpdateSponsorProfile {
                budget_min: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn set_role_completes_onboarding() {
        let pool = test_pool().await;
        let user_id = user(&pool).await;
        let role = SettingsService::set_role(&pool, &user_id, Role::Both).await.unwrap();
        assert_eq!(role, Role::Both);

        let stored = UserRepository::find_by_id(&pool, &user_id).await.unwrap().unwrap();
        assert!(stored.onboarding_completed);
    }

    #[test]
    fn overlong_text_is_rejected() {
        let long = "x".repeat(MAX_TEXT_LEN + 1);
        assert!(SettingsService::validate_text(Some(&long), "lookingFor", MAX_TEXT_LEN).is_err());
        assert!(SettingsService::validate_text(None, "lookingFor", MAX_TEXT_LEN).is_ok());
    }
}
