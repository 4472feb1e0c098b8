pub mod analysis;
pub mod change_detection;
pub mod farms;
pub mod ingestion;
pub mod point;
pub mod scenes;
pub mod tasks;
pub mod tiles;
pub mod zoning;

use crate::common::state::AppState;
use axum::{Router, extract::DefaultBodyLimit};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

/// Every imagery endpoint lives under this prefix.
pub const IMAGERY_PREFIX: &str = "/api/imagery";

pub fn build_router(state: &AppState) -> Router {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Agri imagery API", description = "Satellite scene search, render jobs, tiles and field analysis"),
        modifiers(&SecurityAddon)
    )]
    struct ApiDoc;

    struct SecurityAddon;

    impl utoipa::Modify for SecurityAddon {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            if let Some(components) = openapi.components.as_mut() {
                components.add_security_scheme(
                    "bearerAuth",
                    utoipa::openapi::security::SecurityScheme::Http(
                        utoipa::openapi::security::HttpBuilder::new()
                            .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                            .build(),
                    ),
                );
            }
        }
    }

    let imagery = OpenApiRouter::new()
        .merge(scenes::views::router(state))
        .merge(tiles::views::router(state))
        .merge(tasks::views::router(state))
        .merge(zoning::views::router(state))
        .merge(change_detection::views::router(state))
        .merge(point::views::router(state))
        .merge(ingestion::views::router(state));

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(crate::common::views::router(state))
        .nest(IMAGERY_PREFIX, imagery)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([
                    tiles::proxy::PROVIDER_ERROR.clone(),
                    tiles::proxy::PROVIDER_ERROR_TYPE.clone(),
                ]),
        )
        .split_for_parts();

    router.merge(Scalar::with_url("/api/docs", api))
}
