use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Config;
use crate::db::{AccountTokens, TwitterProfile};
use crate::error::{AppError, AppResult};

const USER_FIELDS: &str = "id,name,username,description,location,url,profile_image_url,profile_banner_url,created_at,public_metrics,verified,verified_type,verified_followers_count";
const PROFILE_IMAGE_NORMAL_SUFFIX: &str = "_normal";
const PROFILE_IMAGE_HIGH_RES_SUFFIX: &str = "_400x400";
const PROFILE_BANNER_DIMENSIONS: &str = "1500x500";

pub const REQUIRED_SCOPES: [&str; 3] = ["tweet.read", "users.read", "offline.access"];

// ============================================================================
// Errors
// ============================================================================

/// Failure while fetching the signed-in user's profile.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Twitter authorization expired (status {status})")]
    Unauthorized { status: u16 },

    #[error("Failed to fetch Twitter data: {status} {reason}")]
    Upstream { status: u16, reason: String },

    #[error("Twitter request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected Twitter response: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
#[error("{description}")]
pub struct TokenRefreshError {
    pub status: Option<u16>,
    pub description: String,
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct UsersMeResponse {
    data: Option<TwitterUser>,
}

/// Profile payload as returned by `GET /2/users/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TwitterUser {
    pub id: String,
    pub name: String,
    pub username: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub url: Option<String>,
    pub profile_image_url: Option<String>,
    pub profile_banner_url: Option<String>,
    pub created_at: Option<String>,
    pub verified: Option<bool>,
    pub verified_type: Option<String>,
    pub verified_followers_count: Option<i64>,
    pub public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PublicMetrics {
    pub followers_count: Option<i64>,
    pub following_count: Option<i64>,
    pub tweet_count: Option<i64>,
    pub listed_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
    error_description: Option<String>,
}

/// Tokens granted by a code exchange or a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl TokenGrant {
    pub fn into_account_tokens(self) -> AccountTokens {
        AccountTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            access_token_expires_at: self.expires_in.map(calculate_token_expiry),
            scope: self.scope,
        }
    }
}

/// Calculate token expiry time
pub fn calculate_token_expiry(expires_in: i64) -> NaiveDateTime {
    (Utc::now() + Duration::seconds(expires_in)).naive_utc()
}

impl TwitterProfile {
    /// Normalize an API payload into the stored profile shape.
    pub fn from_api(user: &TwitterUser) -> Self {
        let metrics = user.public_metrics.clone().unwrap_or_default();

        TwitterProfile {
            twitter_id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            image: user
                .profile_image_url
                .as_ref()
                .map(|u| u.replace(PROFILE_IMAGE_NORMAL_SUFFIX, PROFILE_IMAGE_HIGH_RES_SUFFIX)),
            bio: user.description.clone(),
            location: user.location.clone(),
            url: user.url.clone(),
            banner_url: user
                .profile_banner_url
                .as_ref()
                .map(|u| format!("{}/{}", u, PROFILE_BANNER_DIMENSIONS)),
            verified: user.verified.unwrap_or(false),
            verified_type: user.verified_type.clone(),
            created_at: user
                .created_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.naive_utc()),
            followers: metrics.followers_count.unwrap_or(0),
            following: metrics.following_count.unwrap_or(0),
            tweet_count: metrics.tweet_count.unwrap_or(0),
            listed_count: metrics.listed_count.unwrap_or(0),
            verified_followers: user.verified_followers_count.unwrap_or(0),
        }
    }
}

// ============================================================================
// Client seam
// ============================================================================

#[async_trait]
pub trait TwitterApi: Send + Sync {
    /// Automatic refresh needs a configured client id.
    fn can_refresh(&self) -> bool;

    fn authorize_url(&self, state: &str, code_challenge: &str) -> AppResult<String>;

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<TokenGrant>;

    async fn fetch_profile(&self, access_token: &str) -> Result<TwitterUser, SyncError>;

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant, TokenRefreshError>;
}

#[derive(Debug, Clone)]
pub struct TwitterService {
    client: Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: String,
    api_base_url: String,
    authorize_url: String,
}

impl TwitterService {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            client,
            client_id: config.twitter.client_id.clone(),
            client_secret: config.twitter.client_secret.clone(),
            redirect_uri: config.twitter.redirect_uri.clone(),
            api_base_url: config.twitter.api_base_url.trim_end_matches('/').to_string(),
            authorize_url: config.twitter.authorize_url.clone(),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/2/oauth2/token", self.api_base_url)
    }

    fn token_request(&self, client_id: &str, form: &[(&str, &str)]) -> reqwest::RequestBuilder {
        let request = self.client.post(self.token_url()).form(form);
        match &self.client_secret {
            Some(secret) => request.basic_auth(client_id, Some(secret)),
            None => request,
        }
    }
}

#[async_trait]
impl TwitterApi for TwitterService {
    fn can_refresh(&self) -> bool {
        self.client_id.is_some()
    }

    fn authorize_url(&self, state: &str, code_challenge: &str) -> AppResult<String> {
        let client_id = self.client_id.as_deref().ok_or_else(|| {
            AppError::ServiceUnavailable("Twitter sign-in is not configured".to_string())
        })?;
        let scope = REQUIRED_SCOPES.join(" ");

        let url = url::Url::parse_with_params(
            &self.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", client_id),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| AppError::Internal(e.into()))?;

        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AppResult<TokenGrant> {
        let client_id = self.client_id.as_deref().ok_or_else(|| {
            AppError::ServiceUnavailable("Twitter sign-in is not configured".to_string())
        })?;

        let response = self
            .token_request(
                client_id,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", self.redirect_uri.as_str()),
                    ("code_verifier", code_verifier),
                    ("client_id", client_id),
                ],
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::twitter_api(
                Some(status.as_u16()),
                format!("Failed to exchange code: {}", error_text),
            ));
        }

        let payload: TokenResponse = response.json().await.map_err(|e| {
            AppError::twitter_api(None, format!("Failed to parse token response: {}", e))
        })?;

        let access_token = payload.access_token.ok_or_else(|| {
            AppError::twitter_api(None, "Token response did not include an access token")
        })?;

        Ok(TokenGrant {
            access_token,
            refresh_token: payload.refresh_token,
            expires_in: payload.expires_in,
            scope: payload.scope,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<TwitterUser, SyncError> {
        let response = self
            .client
            .get(format!("{}/2/users/me", self.api_base_url))
            .query(&[("user.fields", USER_FIELDS)])
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(SyncError::Upstream {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body: UsersMeResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;

        body.data
            .ok_or_else(|| SyncError::Decode("response did not include user data".to_string()))
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant, TokenRefreshError> {
        let client_id = self.client_id.as_deref().ok_or_else(|| TokenRefreshError {
            status: None,
            description: "Twitter client id is not configured".to_string(),
        })?;

        let response = self
            .token_request(
                client_id,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("client_id", client_id),
                ],
            )
            .send()
            .await
            .map_err(|e| TokenRefreshError {
                status: None,
                description: format!("Failed to refresh Twitter access token: {}", e),
            })?;

        let status = response.status();
        let payload: Option<TokenResponse> = response.json().await.ok();

        if !status.is_success() {
            return Err(TokenRefreshError {
                status: Some(status.as_u16()),
                description: payload
                    .and_then(|p| p.error_description)
                    .unwrap_or_else(|| {
                        format!(
                            "Failed to refresh Twitter access token: {} {}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or_default()
                        )
                    }),
            });
        }

        let payload = payload.ok_or_else(|| TokenRefreshError {
            status: None,
            description: "Twitter token refresh returned an unreadable body".to_string(),
        })?;

        let Some(access_token) = payload.access_token else {
            return Err(TokenRefreshError {
                status: None,
                description: payload.error_description.unwrap_or_else(|| {
                    "Twitter token refresh succeeded but did not include an access token"
                        .to_string()
                }),
            });
        };

        Ok(TokenGrant {
            access_token,
            refresh_token: payload.refresh_token,
            expires_in: payload.expires_in,
            scope: payload.scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_user() -> TwitterUser {
        serde_json::from_value(serde_json::json!({
            "id": "2244994945",
            "name": "Jane Doe",
            "username": "janedoe",
            "description": "Building things",
            "profile_image_url": "https://pbs.twimg.com/profile_images/1/abc_normal.jpg",
            "profile_banner_url": "https://pbs.twimg.com/profile_banners/2244994945/1690000000",
            "created_at": "2013-12-14T04:35:55.000Z",
            "verified_type": "blue",
            "public_metrics": {
                "followers_count": 3900,
                "following_count": 120,
                "tweet_count": 2000,
                "listed_count": 50
            }
        }))
        .unwrap()
    }

    #[test]
    fn from_api_normalizes_images_and_defaults() {
        let profile = TwitterProfile::from_api(&api_user());

        assert_eq!(
            profile.image.as_deref(),
            Some("https://pbs.twimg.com/profile_images/1/abc_400x400.jpg")
        );
        assert_eq!(
            profile.banner_url.as_deref(),
            Some("https://pbs.twimg.com/profile_banners/2244994945/1690000000/1500x500")
        );
        assert!(!profile.verified);
        assert_eq!(profile.verified_type.as_deref(), Some("blue"));
        assert_eq!(profile.followers, 3_900);
        assert_eq!(profile.verified_followers, 0);
        assert_eq!(
            profile.created_at.map(|d| d.to_string()).as_deref(),
            Some("2013-12-14 04:35:55")
        );
    }

    #[test]
    fn from_api_tolerates_missing_fields() {
        let user = TwitterUser {
            id: "1".to_string(),
            name: "n".to_string(),
            username: "u".to_string(),
            created_at: Some("not a date".to_string()),
            ..Default::default()
        };
        let profile = TwitterProfile::from_api(&user);
        assert_eq!(profile.image, None);
        assert_eq!(profile.banner_url, None);
        assert_eq!(profile.created_at, None);
        assert_eq!(profile.tweet_count, 0);
    }

    #[test]
    fn authorize_url_requires_client_id() {
        let mut config = Config::default();
        let service = TwitterService::new(&config).unwrap();
        assert!(!service.can_refresh());
        assert!(matches!(
            service.authorize_url("s", "c"),
            Err(AppError::ServiceUnavailable(_))
        ));

        config.twitter.client_id = Some("client-123".to_string());
        let service = TwitterService::new(&config).unwrap();
        let url = service.authorize_url("state-token", "challenge").unwrap();
        assert!(url.starts_with("https://twitter.com/i/oauth2/authorize?"));
        assert!(url.contains("scope=tweet.read+users.read+offline.access"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("client_id=client-123"));
    }

    #[test]
    fn grant_without_expiry_has_no_expiry() {
        let grant = TokenGrant {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_in: None,
            scope: None,
        };
        assert!(grant.into_account_tokens().access_token_expires_at.is_none());
    }
}
