use chrono::NaiveDateTime;
use sqlx::{sqlite::SqliteRow, FromRow, Row};

use super::{decode_text_enum, Role};

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub image: Option<String>,

    // Social profile, refreshed by the profile sync. `twitter_id` marks a connected user.
    pub twitter_id: Option<String>,
    pub twitter_username: Option<String>,
    pub twitter_bio: Option<String>,
    pub twitter_location: Option<String>,
    pub twitter_url: Option<String>,
    pub twitter_banner_url: Option<String>,
    pub twitter_verified: bool,
    pub twitter_verified_type: Option<String>,
    pub twitter_created_at: Option<NaiveDateTime>,
    pub twitter_followers: i64,
    pub twitter_following: i64,
    pub twitter_tweet_count: i64,
    pub twitter_listed_count: i64,
    pub twitter_verified_followers: i64,
    pub twitter_synced_at: Option<NaiveDateTime>,

    pub role: Option<Role>,
    pub onboarding_completed: bool,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn is_connected(&self) -> bool {
        self.twitter_id.is_some()
    }

    pub fn is_verified(&self) -> bool {
        self.twitter_verified || self.twitter_verified_type.is_some()
    }
}

impl<'r> FromRow<'r, SqliteRow> for User {
    fn from_row(r: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(User {
            id: r.try_get("id")?,
            name: r.try_get("name")?,
            email: r.try_get("email")?,
            email_verified: r.try_get("email_verified")?,
            image: r.try_get("image")?,
            twitter_id: r.try_get("twitter_id")?,
            twitter_username: r.try_get("twitter_username")?,
            twitter_bio: r.try_get("twitter_bio")?,
            twitter_location: r.try_get("twitter_location")?,
            twitter_url: r.try_get("twitter_url")?,
            twitter_banner_url: r.try_get("twitter_banner_url")?,
            twitter_verified: r.try_get("twitter_verified")?,
            twitter_verified_type: r.try_get("twitter_verified_type")?,
            twitter_created_at: r.try_get("twitter_created_at")?,
            twitter_followers: r.try_get("twitter_followers")?,
            twitter_following: r.try_get("twitter_following")?,
            twitter_tweet_count: r.try_get("twitter_tweet_count")?,
            twitter_listed_count: r.try_get("twitter_listed_count")?,
            twitter_verified_followers: r.try_get("twitter_verified_followers")?,
            twitter_synced_at: r.try_get("twitter_synced_at")?,
            role: decode_text_enum(r, "role")?,
            onboarding_completed: r.try_get("onboarding_completed")?,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        })
    }
}
