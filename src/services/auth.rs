use std::sync::Arc;

use axum::http::{header, HeaderMap};
use axum_extra::extract::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, NaiveDateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::db::{
    AccountRepository, CurrentSession, SessionRepository, TwitterProfile, UserRepository,
    VerificationRepository, TWITTER_PROVIDER_ID,
};
use crate::error::{AppError, AppResult};
use crate::services::profile_sync::SyncFailure;
use crate::AppState;

pub const SESSION_COOKIE: &str = "banner_money.session_token";
const PKCE_IDENTIFIER_PREFIX: &str = "twitter-pkce:";
const SIGN_IN_TTL_MINUTES: i64 = 10;
const DEFAULT_REDIRECT: &str = "/dashboard";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthState {
    pub csrf_token: String,
    pub redirect_to: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

/// Per-request authentication context. `session` is `None` for anonymous callers.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub session: Option<CurrentSession>,
}

/// Where the browser goes once sign-in finishes, plus the session it carries.
#[derive(Debug)]
pub struct SignInOutcome {
    pub session_token: String,
    pub expires_at: NaiveDateTime,
    pub redirect_url: String,
}

/// Client metadata recorded alongside a new session.
#[derive(Debug, Default, Clone)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

pub struct AuthService;

impl AuthService {
    // ========================================================================
    // Tokens
    // ========================================================================

    pub fn generate_random_string(length: usize) -> String {
        use rand::Rng;
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }

    /// Only this digest is stored; the raw token lives in the client's cookie.
    pub fn hash_token(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// PKCE verifier and its S256 challenge.
    pub fn generate_pkce_pair() -> (String, String) {
        let verifier = Self::generate_random_string(64);
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        (verifier, challenge)
    }

    pub fn generate_oauth_state(
        state: &Arc<AppState>,
        csrf_token: String,
        redirect_to: Option<String>,
    ) -> AppResult<String> {
        let now = Utc::now();
        let claims = OAuthState {
            csrf_token,
            redirect_to,
            iat: now.timestamp() as usize,
            exp: (now + Duration::minutes(SIGN_IN_TTL_MINUTES)).timestamp() as usize,
        };

        let state_jwt = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(state.config.auth.secret.as_bytes()),
        )?;

        Ok(state_jwt)
    }

    pub fn decode_oauth_state(state: &Arc<AppState>, state_encoded: &str) -> AppResult<OAuthState> {
        let token_data = decode::<OAuthState>(
            state_encoded,
            &DecodingKey::from_secret(state.config.auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::warn!("Failed to decode OAuth state: {:?}", e);
            e
        })?;
        Ok(token_data.claims)
    }

    // ========================================================================
    // Sign-in flow
    // ========================================================================

    /// Start an OAuth sign-in and return the provider authorize URL.
    pub async fn begin_sign_in(state: &Arc<AppState>, redirect_to: Option<String>) -> AppResult<String> {
        let csrf_token = Self::generate_random_string(32);
        let (verifier, challenge) = Self::generate_pkce_pair();
        let expires_at = (Utc::now() + Duration::minutes(SIGN_IN_TTL_MINUTES)).naive_utc();

        VerificationRepository::create(
            &state.db,
            &format!("{}{}", PKCE_IDENTIFIER_PREFIX, csrf_token),
            &verifier,
            expires_at,
        )
        .await?;

        let oauth_state = Self::generate_oauth_state(state, csrf_token, redirect_to)?;
        state.twitter.authorize_url(&oauth_state, &challenge)
    }

    /// Finish sign-in: exchange the code, upsert user and account, sync the profile, open a session.
    pub async fn handle_twitter_callback(
        state: &Arc<AppState>,
        code: &str,
        oauth_state: OAuthState,
        client: ClientInfo,
    ) -> AppResult<SignInOutcome> {
        let verifier = VerificationRepository::consume(
            &state.db,
            &format!("{}{}", PKCE_IDENTIFIER_PREFIX, oauth_state.csrf_token),
        )
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Sign-in attempt expired or was already used".to_string())
        })?;

        let grant = state.twitter.exchange_code(code, &verifier).await?;

        let api_user = state
            .twitter
            .fetch_profile(&grant.access_token)
            .await
            .map_err(|e| AppError::from(SyncFailure::from(e)))?;
        let profile = TwitterProfile::from_api(&api_user);

        let user = match UserRepository::find_by_twitter_id(&state.db, &profile.twitter_id).await? {
            Some(user) => user,
            None => {
                tracing::info!("Creating user for Twitter account @{}", profile.username);
                UserRepository::create_from_twitter(&state.db, &profile).await?
            }
        };

        AccountRepository::upsert(
            &state.db,
            &user.id,
            TWITTER_PROVIDER_ID,
            &profile.twitter_id,
            &grant.into_account_tokens(),
        )
        .await?;
        UserRepository::apply_twitter_profile(&state.db, &user.id, &profile).await?;

        let (session_token, expires_at) = Self::create_session(state, &user.id, &client).await?;

        let raw_redirect = oauth_state.redirect_to.as_deref().unwrap_or(DEFAULT_REDIRECT);
        let frontend_base = state.config.server.frontend_url.as_str();
        let safe_redirect = if Self::is_safe_redirect(raw_redirect, frontend_base) {
            raw_redirect
        } else {
            tracing::warn!("Rejected unsafe redirect_to value: {}", raw_redirect);
            DEFAULT_REDIRECT
        };

        Ok(SignInOutcome {
            session_token,
            expires_at,
            redirect_url: Self::compose_redirect_url(frontend_base, safe_redirect),
        })
    }

    /// Open a session for `user_id`, returning the raw token and its expiry.
    pub async fn create_session(
        state: &Arc<AppState>,
        user_id: &str,
        client: &ClientInfo,
    ) -> AppResult<(String, NaiveDateTime)> {
        let token = Self::generate_random_string(48);
        let expires_at =
            (Utc::now() + Duration::days(state.config.auth.session_expiration_days)).naive_utc();

        SessionRepository::create(
            &state.db,
            user_id,
            &Self::hash_token(&token),
            expires_at,
            client.ip_address.as_deref(),
            client.user_agent.as_deref(),
        )
        .await?;

        Ok((token, expires_at))
    }

    pub async fn sign_out(state: &Arc<AppState>, token: &str) -> AppResult<()> {
        if !SessionRepository::delete_by_hash(&state.db, &Self::hash_token(token)).await? {
            tracing::debug!("Sign-out for unknown or already removed session");
        }
        Ok(())
    }

    // ========================================================================
    // Request context
    // ========================================================================

    /// Candidate session tokens in precedence order: the session cookie, then
    /// `Authorization: Bearer`.
    pub fn session_tokens_from_headers(headers: &HeaderMap) -> Vec<String> {
        let jar = CookieJar::from_headers(headers);
        let cookie = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());

        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let mut tokens: Vec<String> = cookie.into_iter().collect();
        if let Some(bearer) = bearer {
            if !tokens.contains(&bearer) {
                tokens.push(bearer);
            }
        }
        tokens
    }

    /// The highest-precedence session token, if any.
    pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
        Self::session_tokens_from_headers(headers).into_iter().next()
    }

    /// Resolve the caller's session. A stale cookie falls through to the bearer token.
    /// Anonymous callers get an empty context.
    pub async fn create_context(state: &Arc<AppState>, headers: &HeaderMap) -> AppResult<AuthContext> {
        for token in Self::session_tokens_from_headers(headers) {
            let session =
                SessionRepository::find_active_by_hash(&state.db, &Self::hash_token(&token)).await?;
            if session.is_some() {
                return Ok(AuthContext { session });
            }
        }
        Ok(AuthContext::default())
    }

    // ========================================================================
    // Redirect helpers
    // ========================================================================

    /// Check if redirect URL is safe
    pub fn is_safe_redirect(redirect: &str, frontend_base: &str) -> bool {
        if redirect.starts_with('/') && !redirect.starts_with("//") {
            return true;
        }
        if let Ok(u) = Url::parse(redirect) {
            if let Ok(front) = Url::parse(frontend_base) {
                return u.origin() == front.origin();
            }
        }
        false
    }

    pub fn compose_redirect_url(frontend_base: &str, redirect: &str) -> String {
        if redirect.starts_with("http://") || redirect.starts_with("https://") {
            redirect.to_string()
        } else {
            format!("{}{}", frontend_base.trim_end_matches('/'), redirect)
        }
    }
}
