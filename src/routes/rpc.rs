//! Typed procedures mounted under `/api/rpc`.
//!
//! Every procedure takes a JSON body via POST. Read-only queries also answer GET.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::{Role, SessionUser, UpdateCreatorProfile, UpdateSponsorProfile, UserRepository};
use crate::error::AppError;
use crate::routes::auth::AuthUser;
use crate::routes::extract::RpcInput;
use crate::routes::responses::{MarketplaceUserResponse, SuccessResponse};
use crate::services::navigation::post_onboarding_path;
use crate::services::profile_sync::ProfileSyncService;
use crate::services::settings::SettingsService;
use crate::services::twitter::TwitterUser;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthCheck", get(health_check).post(health_check))
        .route("/privateData", get(private_data).post(private_data))
        .route("/users/getAll", get(get_all_users).post(get_all_users))
        .route("/users/setRole", post(set_role))
        .route("/users/updateCreatorSettings", post(update_creator_settings))
        .route("/users/updateSponsorSettings", post(update_sponsor_settings))
        .route("/twitter/sync", post(sync_twitter))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRoleInput {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetRoleResponse {
    pub success: bool,
    pub role: Role,
    /// Where the front end should continue onboarding
    pub redirect_to: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrivateDataResponse {
    pub message: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SyncResponse {
    pub success: bool,
    pub user: TwitterUser,
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/rpc/healthCheck",
    operation_id = "rpcHealthCheck",
    tag = "rpc",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health_check() -> Json<&'static str> {
    Json("OK")
}

#[utoipa::path(
    get,
    path = "/api/rpc/privateData",
    tag = "rpc",
    responses(
        (status = 200, body = PrivateDataResponse),
        (status = 401, description = "No session")
    )
)]
pub async fn private_data(AuthUser(session): AuthUser) -> Json<PrivateDataResponse> {
    Json(PrivateDataResponse {
        message: "This is private".to_string(),
        user: session.user,
    })
}

/// Every connected user, fewest followers first.
#[utoipa::path(
    get,
    path = "/api/rpc/users/getAll",
    tag = "users",
    responses((status = 200, body = Vec<MarketplaceUserResponse>))
)]
pub async fn get_all_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MarketplaceUserResponse>>, AppError> {
    let users = UserRepository::list_connected(&state.db).await?;
    Ok(Json(users.iter().map(MarketplaceUserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/rpc/users/setRole",
    tag = "users",
    request_body = SetRoleInput,
    responses(
        (status = 200, body = SetRoleResponse),
        (status = 401, description = "No session"),
        (status = 422, description = "Unknown role")
    )
)]
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    RpcInput(input): RpcInput<SetRoleInput>,
) -> Result<Json<SetRoleResponse>, AppError> {
    let role = SettingsService::set_role(&state.db, &session.user.id, input.role).await?;
    Ok(Json(SetRoleResponse {
        success: true,
        role,
        redirect_to: post_onboarding_path(role).to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/rpc/users/updateCreatorSettings",
    tag = "users",
    request_body = UpdateCreatorProfile,
    responses(
        (status = 200, body = SuccessResponse),
        (status = 401, description = "No session"),
        (status = 422, description = "Invalid settings")
    )
)]
pub async fn update_creator_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    RpcInput(input): RpcInput<UpdateCreatorProfile>,
) -> Result<Json<SuccessResponse>, AppError> {
    SettingsService::update_creator_settings(&state.db, &session.user.id, input).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/api/rpc/users/updateSponsorSettings",
    tag = "users",
    request_body = UpdateSponsorProfile,
    responses(
        (status = 200, body = SuccessResponse),
        (status = 401, description = "No session"),
        (status = 422, description = "Invalid settings")
    )
)]
pub async fn update_sponsor_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    RpcInput(input): RpcInput<UpdateSponsorProfile>,
) -> Result<Json<SuccessResponse>, AppError> {
    SettingsService::update_sponsor_settings(&state.db, &session.user.id, input).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/api/rpc/twitter/sync",
    tag = "twitter",
    responses(
        (status = 200, body = SyncResponse),
        (status = 400, description = "Twitter account not connected"),
        (status = 401, description = "No session, or the account must be reconnected"),
        (status = 502, description = "Twitter API failure")
    )
)]
pub async fn sync_twitter(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> Result<Json<SyncResponse>, AppError> {
    let user =
        ProfileSyncService::sync_for_user(&state.db, state.twitter.as_ref(), &session.user.id)
            .await?;
    Ok(Json(SyncResponse {
        success: true,
        user,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::db::repository::user::tests::{connected, insert_unconnected, profile};
    use crate::db::{AccountRepository, AccountTokens, CreatorProfileRepository, TWITTER_PROVIDER_ID};
    use crate::routes::create_router;
    use crate::services::auth::{AuthService, ClientInfo};
    use crate::services::profile_sync::tests::{api_user, FakeTwitter};
    use crate::test_state;

    async fn signed_in(state: &Arc<AppState>, twitter_id: &str, followers: i64) -> (String, String) {
        let user = connected(
            &state.db,
            &profile(twitter_id, &format!("user{}", twitter_id), followers),
        )
        .await;
        let (token, _) = AuthService::create_session(state, &user.id, &ClientInfo::default())
            .await
            .unwrap();
        (user.id, token)
    }

    fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_answers_get_and_post() {
        let app = create_router(test_state(Arc::new(FakeTwitter::new(vec![]))).await);

        let res = app
            .clone()
            .oneshot(Request::get("/api/rpc/healthCheck").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, json!("OK"));

        let res = app
            .oneshot(post("/api/rpc/healthCheck", None, json!({})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_procedures_require_a_session() {
        let app = create_router(test_state(Arc::new(FakeTwitter::new(vec![]))).await);

        for uri in [
            "/api/rpc/privateData",
            "/api/rpc/users/setRole",
            "/api/rpc/twitter/sync",
        ] {
            let res = app
                .clone()
                .oneshot(post(uri, None, json!({ "role": "creator" })))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(json_body(res).await["error"]["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn get_all_lists_connected_users_by_followers_ascending() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        signed_in(&state, "1", 5_000).await;
        signed_in(&state, "2", 10).await;
        insert_unconnected(&state.db, "ghost").await;
        let app = create_router(state);

        let res = app
            .oneshot(Request::get("/api/rpc/users/getAll").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0]["twitterFollowers"], 10);
        assert_eq!(users[1]["twitterFollowers"], 5_000);
        assert!(users[0].get("email").is_none());
    }

    #[tokio::test]
    async fn set_role_completes_onboarding() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        let (user_id, token) = signed_in(&state, "7", 100).await;
        let app = create_router(state.clone());

        let res = app
            .oneshot(post("/api/rpc/users/setRole", Some(&token), json!({ "role": "sponsor" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["role"], "sponsor");
        assert_eq!(body["redirectTo"], "/sponsor/settings?setup=true");

        let user = UserRepository::find_by_id(&state.db, &user_id).await.unwrap().unwrap();
        assert_eq!(user.role, Some(Role::Sponsor));
        assert!(user.onboarding_completed);
    }

    #[tokio::test]
    async fn invalid_role_is_a_validation_error() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        let (_, token) = signed_in(&state, "8", 100).await;
        let app = create_router(state);

        let res = app
            .oneshot(post("/api/rpc/users/setRole", Some(&token), json!({ "role": "admin" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(res).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn partial_creator_update_keeps_stored_price() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        let (user_id, token) = signed_in(&state, "9", 100).await;
        let app = create_router(state.clone());

        let res = app
            .clone()
            .oneshot(post(
                "/api/rpc/users/updateCreatorSettings",
                Some(&token),
                json!({ "priceMin": 500, "priceMax": 900, "categories": ["tech"] }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(post(
                "/api/rpc/users/updateCreatorSettings",
                Some(&token),
                json!({ "status": "hidden" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, json!({ "success": true }));

        let stored = CreatorProfileRepository::find_by_user_id(&state.db, &user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.price_min, Some(500));
        assert_eq!(stored.price_max, Some(900));
        assert_eq!(stored.status, Some(crate::db::CreatorStatus::Hidden));
        assert_eq!(stored.categories.as_deref(), Some(r#"["tech"]"#));
    }

    #[tokio::test]
    async fn inverted_budget_is_rejected() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        let (_, token) = signed_in(&state, "10", 100).await;
        let app = create_router(state);

        let res = app
            .oneshot(post(
                "/api/rpc/users/updateSponsorSettings",
                Some(&token),
                json!({ "budgetMin": 900, "budgetMax": 100 }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn sync_without_account_is_not_connected() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        let (_, token) = signed_in(&state, "11", 100).await;
        let app = create_router(state);

        let res = app
            .oneshot(post("/api/rpc/twitter/sync", Some(&token), json!({})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"]["code"], "ACCOUNT_NOT_CONNECTED");
    }

    #[tokio::test]
    async fn sync_returns_fresh_profile() {
        let fake = FakeTwitter::new(vec![Ok(api_user("12", "grown", 4_200))]);
        let state = test_state(Arc::new(fake)).await;
        let (user_id, token) = signed_in(&state, "12", 100).await;
        AccountRepository::upsert(
            &state.db,
            &user_id,
            TWITTER_PROVIDER_ID,
            "12",
            &AccountTokens {
                access_token: "live".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let app = create_router(state.clone());

        let res = app
            .oneshot(post("/api/rpc/twitter/sync", Some(&token), json!({})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["username"], "grown");

        let user = UserRepository::find_by_id(&state.db, &user_id).await.unwrap().unwrap();
        assert_eq!(user.twitter_followers, 4_200);
    }
}
