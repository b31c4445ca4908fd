pub mod auth;
pub mod directory;
pub mod docs;
pub mod extract;
pub mod health;
pub mod responses;
pub mod rpc;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::middleware;
use crate::AppState;

/// Full application router with unthrottled auth routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    app_router(auth::router(), state)
}

/// Assemble the application around `auth_routes`, which the caller may wrap in a rate limiter.
pub fn app_router(auth_routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/auth", auth_routes)
        .nest(
            "/api/rpc",
            rpc::router().route("/openapi.json", get(docs::openapi_json)),
        )
        .merge(directory::router())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::csp::csp_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::services::profile_sync::tests::FakeTwitter;
    use crate::test_state;

    #[tokio::test]
    async fn health_carries_security_headers() {
        let app = create_router(test_state(Arc::new(FakeTwitter::new(vec![]))).await);

        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("content-security-policy"));
        assert_eq!(res.headers()["x-content-type-options"], "nosniff");

        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = create_router(test_state(Arc::new(FakeTwitter::new(vec![]))).await);

        let res = app
            .oneshot(Request::get("/api/rpc/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["info"]["title"], "banner-money");
    }
}
