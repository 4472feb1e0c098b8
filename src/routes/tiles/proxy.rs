//! Tile proxy with graceful degradation.
//!
//! Map clients cannot attach the provider key themselves, so tiles are
//! fetched server-side. Each request makes at most one upstream GET. Whatever
//! goes wrong (rate limit, missing tile, timeout, bad coordinates, missing
//! configuration) the client still receives `200 OK` with a transparent PNG,
//! `Cache-Control: no-cache` and the reason in `X-Provider-Error` /
//! `X-Provider-Error-Type`, so a flaky upstream never breaks the map.

use super::fallback::fallback_tile;
use super::styling::{DIFF_COLORMAP, VegetationLayer};
use crate::common::error::{ApiError, ErrorKind, MAX_DETAIL_CHARS};
use crate::common::state::AppState;
use crate::provider::ProviderClient;
use crate::routes::IMAGERY_PREFIX;
use axum::{
    body::Bytes,
    http::{HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

pub const RENDER_PATH: &str = "/api/render";
pub const DIFF_RENDER_PATH: &str = "/v1/render/sentinel2/diff";
pub const MAX_ZOOM: u32 = 24;

pub static PROVIDER_ERROR: HeaderName = HeaderName::from_static("x-provider-error");
pub static PROVIDER_ERROR_TYPE: HeaderName = HeaderName::from_static("x-provider-error-type");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCoord {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Rejects tiles outside the `2^z` grid.
    pub fn new(z: u32, x: u32, y: u32) -> Result<Self, ApiError> {
        if z > MAX_ZOOM {
            return Err(ApiError::NotFound(format!("zoom {z} is out of range")));
        }
        let max_tiles = 1u32 << z;
        if x >= max_tiles || y >= max_tiles {
            return Err(ApiError::NotFound(format!(
                "tile {z}/{x}/{y} is outside the grid"
            )));
        }
        Ok(Self { z, x, y })
    }

    fn segments(&self) -> [String; 3] {
        [self.z.to_string(), self.x.to_string(), self.y.to_string()]
    }
}

/// What to render for one tile request.
#[derive(Debug, Clone, PartialEq)]
pub enum TileKey {
    Scene {
        view_id: String,
        layer: VegetationLayer,
        coord: TileCoord,
    },
    Diff {
        baseline_view: String,
        comparison_view: String,
        index: String,
        coord: TileCoord,
    },
}

impl TileKey {
    pub fn coord(&self) -> TileCoord {
        match self {
            TileKey::Scene { coord, .. } | TileKey::Diff { coord, .. } => *coord,
        }
    }

    fn upstream_request(&self, provider: &ProviderClient) -> Result<reqwest::RequestBuilder, ApiError> {
        let [z, x, y] = self.coord().segments();
        let request = match self {
            TileKey::Scene { view_id, layer, .. } => {
                let render = layer.render_params();
                let url = provider.segment_url(RENDER_PATH, &[view_id.as_str(), render.bands, z.as_str(), x.as_str(), y.as_str()])?;
                provider.get_url(url).query(&render.query())
            }
            TileKey::Diff {
                baseline_view,
                comparison_view,
                index,
                ..
            } => {
                let url = provider.segment_url(DIFF_RENDER_PATH, &[index.as_str(), z.as_str(), x.as_str(), y.as_str()])?;
                provider.get_url(url).query(&[
                    ("scene1", baseline_view.as_str()),
                    ("scene2", comparison_view.as_str()),
                    ("colormap", DIFF_COLORMAP),
                ])
            }
        };
        Ok(request.header(header::ACCEPT, "image/*,application/octet-stream"))
    }
}

#[derive(Debug)]
pub struct Tile {
    pub bytes: Bytes,
    pub content_type: String,
}

/// `image/*` or `application/octet-stream`, parameters ignored.
pub fn is_tile_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("image/") || essence == "application/octet-stream"
}

/// One upstream GET, no retry.
pub async fn fetch_tile(provider: &ProviderClient, key: &TileKey) -> Result<Tile, ApiError> {
    let response = provider.send(key.upstream_request(provider)?).await?;
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("image/png")
        .to_string();
    if !is_tile_content_type(&content_type) {
        return Err(ApiError::Upstream {
            status: response.status().as_u16(),
            body: format!("tile response was {content_type}, not an image"),
        });
    }
    let bytes = response.bytes().await?;
    Ok(Tile {
        bytes,
        content_type,
    })
}

/// Value of `X-Provider-Error-Type` for a failure.
pub fn error_type(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::RateLimited => "rate_limit",
        ErrorKind::NotFound => "not_found",
        _ => "error",
    }
}

fn header_safe(message: &str) -> HeaderValue {
    let cleaned: String = message
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { ' ' })
        .take(MAX_DETAIL_CHARS)
        .collect();
    HeaderValue::from_str(cleaned.trim()).unwrap_or_else(|_| HeaderValue::from_static("error"))
}

fn fallback_response(message: &str, error_type: Option<&'static str>) -> Response {
    let mut response = (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        fallback_tile(),
    )
        .into_response();
    let headers = response.headers_mut();
    headers.insert(PROVIDER_ERROR.clone(), header_safe(message));
    if let Some(kind) = error_type {
        headers.insert(PROVIDER_ERROR_TYPE.clone(), HeaderValue::from_static(kind));
    }
    response
}

pub fn no_identifier_response() -> Response {
    debug!("Tile requested without a scene or view identifier");
    fallback_response("no identifier provided", None)
}

/// Logs the failure at a level matching its kind and serves the fallback tile.
pub fn degrade(err: &ApiError) -> Response {
    let kind = err.kind();
    match kind {
        ErrorKind::RateLimited => warn!(error = %err, "Tile upstream rate limited"),
        ErrorKind::NotFound => debug!(error = %err, "Tile not available"),
        _ => error!(kind = %kind, error = %err, "Tile request failed"),
    }
    fallback_response(&err.to_string(), Some(error_type(kind)))
}

pub fn tile_response(tile: Tile, max_age: u64) -> Response {
    (
        [
            (header::CONTENT_TYPE, tile.content_type),
            (header::CACHE_CONTROL, format!("public, max-age={max_age}")),
        ],
        tile.bytes,
    )
        .into_response()
}

/// Full proxy flow for an already parsed key. Always answers 200.
pub async fn serve_tile(state: &AppState, key: Result<TileKey, ApiError>) -> Response {
    let key = match key {
        Ok(key) => key,
        Err(e) => return degrade(&e),
    };
    let provider = match state.provider() {
        Ok(provider) => provider,
        Err(e) => return degrade(&e),
    };
    match fetch_tile(provider, &key).await {
        Ok(tile) => tile_response(tile, state.config.tile_cache_max_age),
        Err(e) => degrade(&e),
    }
}

/// Percent-encodes a query value (RFC 3986 unreserved characters pass).
fn escape_query_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Browser-facing template for diff tiles, routed through this service so the
/// provider key never leaves the server.
pub fn diff_tile_template(baseline_view: &str, comparison_view: &str, index: &str) -> String {
    format!(
        "{IMAGERY_PREFIX}/change-detection/tiles/{{z}}/{{x}}/{{y}}?viewId1={}&viewId2={}&index={}",
        escape_query_value(baseline_view),
        escape_query_value(comparison_view),
        escape_query_value(index),
    )
}
