use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::db::UserRepository;
use crate::error::AppError;
use crate::marketplace::{category_table, CategoryInfo};
use crate::routes::extract::ValidQuery;
use crate::routes::responses::{DirectoryEntry, DirectorySide};
use crate::services::auth::AuthContext;
use crate::services::directory::{
    filter_creators, filter_sponsors, is_listed_creator, is_listed_sponsor, FilterCriteria,
};
use crate::services::navigation::{self, NavigationDecision, Screen, Visitor};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/directory/creators", get(list_creators))
        .route("/api/directory/creators/:username", get(get_creator))
        .route("/api/directory/sponsors", get(list_sponsors))
        .route("/api/directory/sponsors/:username", get(get_sponsor))
        .route("/api/categories", get(list_categories))
        .route("/api/navigation", get(resolve_navigation))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NavigationQuery {
    /// Screen the visitor is trying to open
    pub screen: Screen,
}

#[utoipa::path(
    get,
    path = "/api/directory/creators",
    tag = "directory",
    params(FilterCriteria),
    responses((status = 200, body = Vec<DirectoryEntry>))
)]
pub async fn list_creators(
    State(state): State<Arc<AppState>>,
    ValidQuery(criteria): ValidQuery<FilterCriteria>,
) -> Result<Json<Vec<DirectoryEntry>>, AppError> {
    let users = UserRepository::list_connected(&state.db).await?;
    let entries = filter_creators(&users, &criteria)
        .into_iter()
        .map(|u| DirectoryEntry::new(u, DirectorySide::Creators))
        .collect();
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/api/directory/sponsors",
    tag = "directory",
    params(FilterCriteria),
    responses((status = 200, body = Vec<DirectoryEntry>))
)]
pub async fn list_sponsors(
    State(state): State<Arc<AppState>>,
    ValidQuery(criteria): ValidQuery<FilterCriteria>,
) -> Result<Json<Vec<DirectoryEntry>>, AppError> {
    let users = UserRepository::list_connected(&state.db).await?;
    let entries = filter_sponsors(&users, &criteria)
        .into_iter()
        .map(|u| DirectoryEntry::new(u, DirectorySide::Sponsors))
        .collect();
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/api/directory/creators/{username}",
    tag = "directory",
    params(("username" = String, Path, description = "Twitter handle, any case")),
    responses(
        (status = 200, body = DirectoryEntry),
        (status = 404, description = "Not a listed creator")
    )
)]
pub async fn get_creator(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<DirectoryEntry>, AppError> {
    let entry = UserRepository::find_connected_by_username(&state.db, &username)
        .await?
        .filter(is_listed_creator)
        .ok_or_else(|| AppError::NotFound(format!("Creator @{} not found", username)))?;
    Ok(Json(DirectoryEntry::new(&entry, DirectorySide::Creators)))
}

#[utoipa::path(
    get,
    path = "/api/directory/sponsors/{username}",
    tag = "directory",
    params(("username" = String, Path, description = "Twitter handle, any case")),
    responses(
        (status = 200, body = DirectoryEntry),
        (status = 404, description = "Not a listed sponsor")
    )
)]
pub async fn get_sponsor(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<DirectoryEntry>, AppError> {
    let entry = UserRepository::find_connected_by_username(&state.db, &username)
        .await?
        .filter(is_listed_sponsor)
        .ok_or_else(|| AppError::NotFound(format!("Sponsor @{} not found", username)))?;
    Ok(Json(DirectoryEntry::new(&entry, DirectorySide::Sponsors)))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "directory",
    responses((status = 200, body = Vec<CategoryInfo>))
)]
pub async fn list_categories() -> Json<Vec<CategoryInfo>> {
    Json(category_table())
}

/// Decide whether the visitor may open `screen`, or where to send them instead.
#[utoipa::path(
    get,
    path = "/api/navigation",
    tag = "directory",
    params(NavigationQuery),
    responses((status = 200, body = NavigationDecision))
)]
pub async fn resolve_navigation(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidQuery(query): ValidQuery<NavigationQuery>,
) -> Result<Json<NavigationDecision>, AppError> {
    let visitor = match ctx.session {
        Some(session) => {
            let user = UserRepository::find_by_id(&state.db, &session.user.id).await?;
            Visitor {
                has_session: true,
                connected: user.as_ref().is_some_and(|u| u.is_connected()),
                role: user.and_then(|u| u.role),
            }
        }
        None => Visitor::default(),
    };

    Ok(Json(navigation::resolve(query.screen, visitor)))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::db::repository::user::tests::{connected, profile};
    use crate::db::{
        CreatorStatus, Role, SponsorStatus, UpdateCreatorProfile, UpdateSponsorProfile,
    };
    use crate::routes::create_router;
    use crate::services::auth::{AuthService, ClientInfo};
    use crate::services::profile_sync::tests::FakeTwitter;
    use crate::services::settings::SettingsService;
    use crate::test_state;

    async fn seed(state: &Arc<AppState>) {
        let pool = &state.db;

        let mut alice = profile("1", "Alice", 3_900);
        alice.listed_count = 50;
        alice.tweet_count = 2_000;
        let alice = connected(pool, &alice).await;
        SettingsService::set_role(pool, &alice.id, Role::Creator).await.unwrap();
        SettingsService::update_creator_settings(
            pool,
            &alice.id,
            UpdateCreatorProfile {
                status: Some(CreatorStatus::Available),
                price_min: Some(500),
                price_max: Some(1_000),
                categories: Some(vec!["tech".to_string(), "gaming".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let bob = connected(pool, &profile("2", "bob", 90_000)).await;
        SettingsService::set_role(pool, &bob.id, Role::Both).await.unwrap();
        SettingsService::update_creator_settings(
            pool,
            &bob.id,
            UpdateCreatorProfile {
                status: Some(CreatorStatus::Hidden),
                categories: Some(vec!["tech".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        SettingsService::update_sponsor_settings(
            pool,
            &bob.id,
            UpdateSponsorProfile {
                status: Some(SponsorStatus::Active),
                company_name: Some("Bob Co".to_string()),
                budget_min: Some(200),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let res = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn creator_directory_lists_available_creators() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        seed(&state).await;
        let app = create_router(state);

        let (status, body) = get_json(&app, "/api/directory/creators").await;
        assert_eq!(status, StatusCode::OK);
        let cards = body.as_array().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["twitterUsername"], "Alice");
        assert_eq!(cards[0]["estimatedMonthlyVisits"], 6_513);
        assert_eq!(cards[0]["priceDisplay"], "$500-$1,000/wk");
        assert_eq!(cards[0]["categoryLabels"].as_array().unwrap().len(), 2);

        let (_, body) = get_json(&app, "/api/directory/creators?categories=finance").await;
        assert!(body.as_array().unwrap().is_empty());

        let (_, body) = get_json(&app, "/api/directory/creators?maxPrice=400").await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sponsor_directory_and_lookup() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        seed(&state).await;
        let app = create_router(state);

        let (_, body) = get_json(&app, "/api/directory/sponsors").await;
        let cards = body.as_array().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["sponsor"]["companyName"], "Bob Co");
        assert_eq!(cards[0]["priceDisplay"], "from $200/wk");

        let (status, body) = get_json(&app, "/api/directory/sponsors/BOB").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "bob");

        // Hidden as a creator, so not reachable through the creator lookup.
        let (status, body) = get_json(&app, "/api/directory/creators/bob").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = get_json(&app, "/api/directory/creators/alice").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_filter_is_a_validation_error() {
        let app = create_router(test_state(Arc::new(FakeTwitter::new(vec![]))).await);
        let (status, body) = get_json(&app, "/api/directory/creators?minFollowers=lots").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn blank_form_fields_are_ignored() {
        let app = create_router(test_state(Arc::new(FakeTwitter::new(vec![]))).await);
        let (status, body) = get_json(
            &app,
            "/api/directory/creators?search=&minFollowers=&minPrice=&maxPrice=&categories=",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_array());
    }

    #[tokio::test]
    async fn categories_table_is_complete() {
        let app = create_router(test_state(Arc::new(FakeTwitter::new(vec![]))).await);
        let (status, body) = get_json(&app, "/api/categories").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 15);
        assert_eq!(body[2]["value"], "dev-tools");
        assert_eq!(body[2]["label"], "Developer Tools");
    }

    #[tokio::test]
    async fn navigation_follows_session_and_role() {
        let state = test_state(Arc::new(FakeTwitter::new(vec![]))).await;
        let app = create_router(state.clone());

        let (_, body) = get_json(&app, "/api/navigation?screen=dashboard").await;
        assert_eq!(body["redirect"], "/login");

        let user = connected(&state.db, &profile("5", "newcomer", 1)).await;
        let (token, _) = AuthService::create_session(&state, &user.id, &ClientInfo::default())
            .await
            .unwrap();

        let res = app
            .clone()
            .oneshot(
                Request::get("/api/navigation?screen=dashboard")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["screen"], "dashboard");
        assert_eq!(body["redirect"], "/onboarding");
        assert_eq!(body["needsSync"], false);

        let (status, _) = get_json(&app, "/api/navigation?screen=nowhere").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
