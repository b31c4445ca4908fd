use chrono::NaiveDateTime;
use sqlx::FromRow;

pub const TWITTER_PROVIDER_ID: &str = "twitter";

/// OAuth credentials for one linked provider account.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub provider_id: String,
    /// The provider's identifier for the user
    pub account_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token_expires_at: Option<NaiveDateTime>,
    pub scope: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Token material written after a code exchange or a refresh.
#[derive(Debug, Clone, Default)]
pub struct AccountTokens {
    pub access_token: String,
    /// `None` keeps whatever refresh token is already stored.
    pub refresh_token: Option<String>,
    pub access_token_expires_at: Option<NaiveDateTime>,
    pub scope: Option<String>,
}
