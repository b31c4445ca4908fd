use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::*;
use crate::db::{CreatorProfileRepository, SponsorProfileRepository};
use crate::error::{AppError, AppResult};

const USER_COLUMNS: &str = r#"
    id, name, email, email_verified, image,
    twitter_id, twitter_username, twitter_bio, twitter_location, twitter_url,
    twitter_banner_url, twitter_verified, twitter_verified_type, twitter_created_at,
    twitter_followers, twitter_following, twitter_tweet_count, twitter_listed_count,
    twitter_verified_followers, twitter_synced_at,
    role, onboarding_completed,
    created_at, updated_at
"#;

// ============================================================================
// User Repository
// ============================================================================

pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(AppError::Database)
    }

    pub async fn find_by_twitter_id(pool: &SqlitePool, twitter_id: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE twitter_id = ?",
            USER_COLUMNS
        ))
        .bind(twitter_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Create the user row at first sign-in. Role stays unset and onboarding incomplete.
    pub async fn create_from_twitter(pool: &SqlitePool, profile: &TwitterProfile) -> AppResult<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, image, twitter_id, twitter_username, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&id)
        .bind(&profile.name)
        .bind(&profile.image)
        .bind(&profile.twitter_id)
        .bind(&profile.username)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(AppError::Database)
    }

    /// Write a freshly fetched social profile onto the user and stamp the sync time.
    pub async fn apply_twitter_profile(
        pool: &SqlitePool,
        user_id: &str,
        profile: &TwitterProfile,
    ) -> AppResult<User> {
        let now = Utc::now().naive_utc();

        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = ?,
                image = ?,
                twitter_id = ?,
                twitter_username = ?,
                twitter_bio = ?,
                twitter_location = ?,
                twitter_url = ?,
                twitter_banner_url = ?,
                twitter_verified = ?,
                twitter_verified_type = ?,
                twitter_created_at = ?,
                twitter_followers = ?,
                twitter_following = ?,
                twitter_tweet_count = ?,
                twitter_listed_count = ?,
                twitter_verified_followers = ?,
                twitter_synced_at = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&profile.name)
        .bind(&profile.image)
        .bind(&profile.twitter_id)
        .bind(&profile.username)
        .bind(&profile.bio)
        .bind(&profile.location)
        .bind(&profile.url)
        .bind(&profile.banner_url)
        .bind(profile.verified)
        .bind(&profile.verified_type)
        .bind(profile.created_at)
        .bind(profile.followers)
        .bind(profile.following)
        .bind(profile.tweet_count)
        .bind(profile.listed_count)
        .bind(profile.verified_followers)
        .bind(now)
        .bind(now)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Set the marketplace role. Choosing a role always completes onboarding.
    pub async fn set_role(pool: &SqlitePool, user_id: &str, role: Role) -> AppResult<()> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = ?, onboarding_completed = 1, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(role.as_str())
        .bind(now)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    /// Set the role only when none is stored yet. Returns whether a row changed.
    pub async fn set_role_if_unset(pool: &SqlitePool, user_id: &str, role: Role) -> AppResult<bool> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            "UPDATE users SET role = ?, updated_at = ? WHERE id = ? AND role IS NULL",
        )
        .bind(role.as_str())
        .bind(now)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    /// Every connected user with both role sections, by follower count ascending.
    pub async fn list_connected(pool: &SqlitePool) -> AppResult<Vec<MarketplaceUser>> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE twitter_id IS NOT NULL
            ORDER BY twitter_followers ASC, created_at ASC
            "#,
            USER_COLUMNS
        ))
        .fetch_all(pool)
        .await
        .map_err(AppError::Database)?;

        let mut creators: HashMap<String, CreatorProfile> =
            CreatorProfileRepository::list_all(pool)
                .await?
                .into_iter()
                .map(|p| (p.user_id.clone(), p))
                .collect();
        let mut sponsors: HashMap<String, SponsorProfile> =
            SponsorProfileRepository::list_all(pool)
                .await?
                .into_iter()
                .map(|p| (p.user_id.clone(), p))
                .collect();

        Ok(users
            .into_iter()
            .map(|user| MarketplaceUser {
                creator: creators.remove(&user.id),
                sponsor: sponsors.remove(&user.id),
                user,
            })
            .collect())
    }

    /// Case-insensitive handle lookup among connected users.
    pub async fn find_connected_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> AppResult<Option<MarketplaceUser>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE twitter_id IS NOT NULL AND LOWER(twitter_username) = LOWER(?)
            LIMIT 1
            "#,
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Database)?;

        let Some(user) = user else {
            return Ok(None);
        };

        let creator = CreatorProfileRepository::find_by_user_id(pool, &user.id).await?;
        let sponsor = SponsorProfileRepository::find_by_user_id(pool, &user.id).await?;

        Ok(Some(MarketplaceUser {
            user,
            creator,
            sponsor,
        }))
    }
}
