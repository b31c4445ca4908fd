use chrono::NaiveDateTime;

/// Social profile in the shape stored on the user row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwitterProfile {
    pub twitter_id: String,
    pub name: String,
    pub username: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub banner_url: Option<String>,
    pub verified: bool,
    pub verified_type: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub followers: i64,
    pub following: i64,
    pub tweet_count: i64,
    pub listed_count: i64,
    pub verified_followers: i64,
}
