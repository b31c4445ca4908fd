use axum::Json;
use utoipa::OpenApi;

use crate::routes::{directory, health, rpc};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "banner-money",
        description = "Marketplace API connecting creators who sell profile banner space with sponsors"
    ),
    paths(
        health::health_check,
        rpc::health_check,
        rpc::private_data,
        rpc::get_all_users,
        rpc::set_role,
        rpc::update_creator_settings,
        rpc::update_sponsor_settings,
        rpc::sync_twitter,
        directory::list_creators,
        directory::list_sponsors,
        directory::get_creator,
        directory::get_sponsor,
        directory::list_categories,
        directory::resolve_navigation,
    ),
    tags(
        (name = "rpc", description = "Session and liveness procedures"),
        (name = "users", description = "Marketplace listing and settings"),
        (name = "twitter", description = "Social profile synchronization"),
        (name = "directory", description = "Filtered creator and sponsor views")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_covers_procedures_and_directory() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for path in [
            "/api/rpc/users/getAll",
            "/api/rpc/users/updateCreatorSettings",
            "/api/rpc/twitter/sync",
            "/api/directory/creators",
            "/api/directory/creators/{username}",
            "/api/navigation",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
        assert!(doc["components"]["schemas"]
            .as_object()
            .unwrap()
            .contains_key("UpdateCreatorProfile"));
    }
}
