use super::proxy::{self, TileCoord, TileKey};
use super::styling::VegetationLayer;
use crate::common::{error::ApiError, state::AppState};
use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TileParams {
    /// Scene identifier returned by search
    #[serde(rename = "sceneID")]
    #[param(rename = "sceneID")]
    pub scene_id: Option<String>,
    /// Provider view id; preferred over `sceneID` when both are present
    #[serde(rename = "viewId")]
    #[param(rename = "viewId")]
    pub view_id: Option<String>,
    /// ndvi, ndmi, evi or anything else for true colour
    pub layer: Option<String>,
}

impl TileParams {
    fn identifier(&self) -> Option<&str> {
        [self.view_id.as_deref(), self.scene_id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|id| !id.is_empty())
    }
}

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(scene_tile))
        .with_state(state.clone())
}

/// Parse a tile coordinate from a string, handling both integers and floats.
/// Floats are truncated toward zero. Negative values are rejected.
pub(crate) fn parse_tile_coord(s: &str) -> Result<u32, ApiError> {
    if let Ok(v) = s.parse::<u32>() {
        return Ok(v);
    }
    // Some map clients send fractional coordinates like "3.7"
    let invalid = || ApiError::NotFound(format!("invalid tile coordinate '{s}'"));
    let f = s.parse::<f64>().map_err(|_| invalid())?;
    if f < 0.0 || !f.is_finite() {
        return Err(invalid());
    }
    Ok(f.trunc() as u32)
}

pub(crate) fn parse_tile(z: &str, x: &str, y: &str) -> Result<TileCoord, ApiError> {
    TileCoord::new(parse_tile_coord(z)?, parse_tile_coord(x)?, parse_tile_coord(y)?)
}

#[utoipa::path(
    get,
    path = "/tiles/{z}/{x}/{y}",
    params(
        ("z" = String, Path, description = "Zoom level"),
        ("x" = String, Path, description = "Tile x coordinate"),
        ("y" = String, Path, description = "Tile y coordinate"),
        TileParams
    ),
    responses(
        (status = 200, description = "Rendered tile, or a transparent PNG with X-Provider-Error headers when the provider fails", body = [u8], content_type = "image/png")
    ),
    summary = "Proxy a satellite map tile",
    description = "Always answers 200 so map clients keep rendering. Failures are reported through X-Provider-Error and X-Provider-Error-Type."
)]
pub async fn scene_tile(
    State(state): State<AppState>,
    Path((z, x, y)): Path<(String, String, String)>,
    Query(params): Query<TileParams>,
) -> Response {
    let Some(view_id) = params.identifier() else {
        return proxy::no_identifier_response();
    };
    let key = parse_tile(&z, &x, &y).map(|coord| TileKey::Scene {
        view_id: view_id.to_string(),
        layer: VegetationLayer::parse(params.layer.as_deref()),
        coord,
    });
    proxy::serve_tile(&state, key).await
}
