use sqlx::SqlitePool;

use crate::db::{AccountRepository, TwitterProfile, UserRepository, TWITTER_PROVIDER_ID};
use crate::error::{AppError, AppResult};
use crate::services::twitter::{SyncError, TwitterApi, TwitterUser};

const RECONNECT_NO_REFRESH_TOKEN: &str =
    "Twitter authorization expired and no refresh token is available. Please reconnect your account.";
const RECONNECT_REFRESH_UNAVAILABLE: &str =
    "Twitter authorization expired and automatic refresh is unavailable. Please reconnect your account.";
const RECONNECT_REFRESH_FAILED: &str =
    "Twitter authorization expired and could not be refreshed automatically. Please reconnect your account.";

pub struct ProfileSyncService;

impl ProfileSyncService {
    /// Fetch the profile with `access_token` and write it onto the user.
    pub async fn fetch_and_store(
        pool: &SqlitePool,
        twitter: &dyn TwitterApi,
        user_id: &str,
        access_token: &str,
    ) -> Result<TwitterUser, SyncFailure> {
        let api_user = twitter.fetch_profile(access_token).await?;
        UserRepository::apply_twitter_profile(pool, user_id, &TwitterProfile::from_api(&api_user))
            .await?;
        Ok(api_user)
    }

    /// Refresh the user's social profile, refreshing an expired access token at most once.
    pub async fn sync_for_user(
        pool: &SqlitePool,
        twitter: &dyn TwitterApi,
        user_id: &str,
    ) -> AppResult<TwitterUser> {
        let account =
            AccountRepository::find_by_user_and_provider(pool, user_id, TWITTER_PROVIDER_ID)
                .await?
                .ok_or(AppError::AccountNotConnected)?;
        let access_token = account
            .access_token
            .clone()
            .ok_or(AppError::AccountNotConnected)?;

        match Self::fetch_and_store(pool, twitter, user_id, &access_token).await {
            Ok(user) => return Ok(user),
            Err(SyncFailure::Sync(SyncError::Unauthorized { .. })) => {}
            Err(other) => return Err(other.into()),
        }

        let Some(refresh_token) = account.refresh_token.as_deref() else {
            return Err(AppError::Reconnect(RECONNECT_NO_REFRESH_TOKEN.to_string()));
        };

        if !twitter.can_refresh() {
            return Err(AppError::Reconnect(RECONNECT_REFRESH_UNAVAILABLE.to_string()));
        }

        tracing::info!("Access token expired for user {}; refreshing once", user_id);

        let grant = match twitter.refresh_access_token(refresh_token).await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::warn!(
                    "Twitter token refresh failed for user {} (status {:?}): {}",
                    user_id,
                    e.status,
                    e
                );
                return Err(AppError::Reconnect(RECONNECT_REFRESH_FAILED.to_string()));
            }
        };

        let new_access_token = grant.access_token.clone();
        if let Err(e) =
            AccountRepository::update_tokens(pool, &account.id, &grant.into_account_tokens()).await
        {
            tracing::error!("Failed to persist refreshed tokens for user {}: {}", user_id, e);
            return Err(AppError::Reconnect(RECONNECT_REFRESH_FAILED.to_string()));
        }

        Self::fetch_and_store(pool, twitter, user_id, &new_access_token)
            .await
            .map_err(|e| {
                tracing::warn!("Retried Twitter sync failed for user {}: {}", user_id, e);
                AppError::Reconnect(RECONNECT_REFRESH_FAILED.to_string())
            })
    }
}

/// Either stage of a fetch-and-store attempt.
#[derive(Debug, thiserror::Error)]
pub enum SyncFailure {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<SyncFailure> for AppError {
    fn from(failure: SyncFailure) -> Self {
        match failure {
            SyncFailure::Store(e) => e,
            SyncFailure::Sync(SyncError::Transport(e)) => AppError::Request(e),
            SyncFailure::Sync(SyncError::Unauthorized { status })
            | SyncFailure::Sync(SyncError::Upstream { status, .. }) => AppError::twitter_api(
                Some(status),
                format!("Twitter sync failed (status {}).", status),
            ),
            SyncFailure::Sync(SyncError::Decode(msg)) => {
                AppError::twitter_api(None, format!("Twitter sync failed: {}", msg))
            }
        }
    }
}
