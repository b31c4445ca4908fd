use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, Query, State},
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use utoipa::ToSchema;

use crate::config::Config;
use crate::db::CurrentSession;
use crate::error::AppError;
use crate::routes::responses::SuccessResponse;
use crate::services::auth::{AuthContext, AuthService, ClientInfo, SESSION_COOKIE};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sign-in/twitter", get(sign_in_twitter))
        .route("/callback/twitter", get(callback_twitter))
        .route("/error", get(auth_error))
        .route("/get-session", get(get_session))
        .route("/sign-out", post(sign_out))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    redirect_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session: Option<CurrentSession>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start Twitter OAuth sign-in
async fn sign_in_twitter(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignInQuery>,
) -> Result<impl IntoResponse, AppError> {
    let redirect_to = query.redirect_to.filter(|r| !r.is_empty());
    let auth_url = AuthService::begin_sign_in(&state, redirect_to).await?;
    Ok(Redirect::to(&auth_url))
}

/// Handle Twitter OAuth callback
async fn callback_twitter(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!("OAuth provider returned error: {} - {}", error, description);

        let params = form_urlencoded::Serializer::new(String::new())
            .append_pair("error", &error)
            .append_pair("error_description", &description)
            .finish();
        let error_url = format!(
            "{}/api/auth/error?{}",
            state.config.server.base_url.trim_end_matches('/'),
            params
        );
        return Ok((jar, Redirect::to(&error_url)));
    }

    let code = query.code.ok_or_else(|| {
        tracing::error!("OAuth callback missing authorization code");
        AppError::BadRequest("Missing authorization code".to_string())
    })?;

    let state_encoded = query.state.ok_or_else(|| {
        tracing::error!("OAuth callback missing state parameter");
        AppError::BadRequest("Missing state parameter".to_string())
    })?;
    let oauth_state = AuthService::decode_oauth_state(&state, &state_encoded)?;

    let client = client_info(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let outcome = AuthService::handle_twitter_callback(&state, &code, oauth_state, client).await?;

    tracing::info!("Sign-in complete, redirecting to {}", outcome.redirect_url);

    let jar = jar.add(session_cookie(&state.config, outcome.session_token));
    Ok((jar, Redirect::to(&outcome.redirect_url)))
}

/// Send the browser to the front-end login page with the error details.
async fn auth_error(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let error = params
        .iter()
        .find(|(k, _)| k == "error")
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown_error");
    tracing::warn!("Authentication error: {} ({:?})", error, params);

    Redirect::to(&login_error_url(&state.config.server.frontend_url, error, &params))
}

async fn get_session(ctx: AuthContext) -> Json<SessionResponse> {
    Json(SessionResponse {
        session: ctx.session,
    })
}

/// Invalidate the current session and clear its cookie
async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = AuthService::session_token_from_headers(&headers) {
        AuthService::sign_out(&state, &token).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(SuccessResponse::ok())))
}

// ============================================================================
// Helpers
// ============================================================================

fn same_site(config: &Config) -> SameSite {
    match config
        .server
        .cookie_same_site
        .as_deref()
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("strict") => SameSite::Strict,
        Some("none") => SameSite::None,
        _ => SameSite::Lax,
    }
}

fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(config.cookie_secure())
        .same_site(same_site(config))
        .path("/")
        .max_age(time::Duration::days(config.auth.session_expiration_days))
        .build()
}

/// `{frontend}/login` carrying `error` first, then every other forwarded param.
fn login_error_url(frontend_url: &str, error: &str, params: &[(String, String)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("error", error);
    for (key, value) in params.iter().filter(|(k, _)| k != "error") {
        query.append_pair(key, value);
    }
    format!("{}/login?{}", frontend_url.trim_end_matches('/'), query.finish())
}

fn client_info(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientInfo {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());

    ClientInfo {
        ip_address: forwarded.or_else(|| peer.map(|addr| addr.ip().to_string())),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

// ============================================================================
// Auth Extractors
// ============================================================================

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        AuthService::create_context(state, &parts.headers).await
    }
}

/// Extractor for routes that need a signed-in user
pub struct AuthUser(pub CurrentSession);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::from_request_parts(parts, state).await?;
        let session = ctx.session.ok_or(AppError::Unauthorized)?;

        tracing::debug!("Authenticated user: {}", session.user.id);
        Ok(AuthUser(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::routes::create_router;
    use crate::services::profile_sync::tests::{api_user, FakeTwitter};
    use crate::test_state;

    fn location(res: &axum::response::Response) -> String {
        res.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn login_error_url_forwards_params() {
        let params = vec![
            ("error".to_string(), "access_denied".to_string()),
            ("error_description".to_string(), "user said no".to_string()),
            ("attempt".to_string(), "2".to_string()),
        ];
        assert_eq!(
            login_error_url("http://localhost:3000/", "access_denied", &params),
            "http://localhost:3000/login?error=access_denied&error_description=user+said+no&attempt=2"
        );
    }

    #[test]
    fn client_info_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        headers.insert(header::USER_AGENT, "test-agent".parse().unwrap());
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        let info = client_info(&headers, Some(peer));
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(info.user_agent.as_deref(), Some("test-agent"));

        let info = client_info(&HeaderMap::new(), Some(peer));
        assert_eq!(info.ip_address.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn same_site_defaults_to_lax() {
        let mut config = Config::default();
        assert_eq!(same_site(&config), SameSite::Lax);
        config.server.cookie_same_site = Some("Strict".to_string());
        assert_eq!(same_site(&config), SameSite::Strict);
    }

    #[tokio::test]
    async fn error_endpoint_defaults_error_code() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        let app = create_router(state);

        let res = app
            .oneshot(Request::get("/api/auth/error").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.status().is_redirection());
        assert_eq!(location(&res), "http://localhost:3000/login?error=unknown_error");
    }

    #[tokio::test]
    async fn provider_error_redirects_to_error_endpoint() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        let app = create_router(state);

        let res = app
            .oneshot(
                Request::get("/api/auth/callback/twitter?error=access_denied&error_description=nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(res.status().is_redirection());
        assert_eq!(
            location(&res),
            "http://localhost:8080/api/auth/error?error=access_denied&error_description=nope"
        );
    }

    #[tokio::test]
    async fn full_sign_in_sets_cookie_and_session_resolves() {
        let fake = FakeTwitter::new(vec![Ok(api_user("900", "cookie_monster", 10))]);
        let state = test_state(Arc::new(fake)).await;
        let app = create_router(state);

        let res = app
            .clone()
            .oneshot(
                Request::get("/api/auth/sign-in/twitter?redirect_to=/onboarding")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(res.status().is_redirection());
        let authorize = url::Url::parse(&location(&res)).unwrap();
        let state_param = authorize
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        let callback = format!(
            "/api/auth/callback/twitter?{}",
            form_urlencoded::Serializer::new(String::new())
                .append_pair("code", "abc")
                .append_pair("state", &state_param)
                .finish()
        );
        let res = app
            .clone()
            .oneshot(Request::get(callback).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.status().is_redirection());
        assert_eq!(location(&res), "http://localhost:3000/onboarding");

        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("banner_money.session_token="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        let cookie_pair = set_cookie.split(';').next().unwrap().to_string();

        let res = app
            .clone()
            .oneshot(
                Request::get("/api/auth/get-session")
                    .header(header::COOKIE, &cookie_pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["session"]["user"]["name"], "cookie_monster");

        let res = app
            .clone()
            .oneshot(
                Request::post("/api/auth/sign-out")
                    .header(header::COOKIE, &cookie_pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(
                Request::get("/api/auth/get-session")
                    .header(header::COOKIE, &cookie_pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["session"].is_null());
    }
}
