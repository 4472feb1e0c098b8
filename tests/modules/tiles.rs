// Tile proxy: success passthrough and graceful degradation

use crate::common::fixtures::TILE_BYTES;
use crate::common::{client::TestResponse, spawn_app, spawn_app_with};
use axum::http::StatusCode;
use std::time::Duration;

const VIEW_ID: &str = "S2/36/R/VU/2025-06-04/0";

fn assert_fallback(response: &TestResponse, error_type: Option<&str>) {
    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert_eq!(response.header("cache-control"), Some("no-cache"));
    assert!(response.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    assert_ne!(&response.bytes[..], TILE_BYTES);
    assert!(response.header("x-provider-error").is_some());
    assert_eq!(response.header("x-provider-error-type"), error_type);
}

#[tokio::test]
async fn test_tile_is_proxied() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(&format!("/api/imagery/tiles/10/600/400?viewId={VIEW_ID}&layer=ndvi"))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(&response.bytes[..], TILE_BYTES);
    assert_eq!(response.header("content-type"), Some("image/png"));
    assert_eq!(response.header("cache-control"), Some("public, max-age=3600"));
    assert!(response.header("x-provider-error").is_none());

    let hits = app.provider.hits_to("/api/render");
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.path, "/api/render/S2%2F36%2FR%2FVU%2F2025-06-04%2F0/NDVI/10/600/400");
    assert!(hit.query.as_deref().unwrap_or_default().contains("COLORMAP="));
    assert_eq!(hit.api_key.as_deref(), Some("test-api-key"));
}

#[tokio::test]
async fn test_scene_id_is_used_when_view_id_is_blank() {
    let app = spawn_app().await;

    let response = app
        .client
        .get("/api/imagery/tiles/3/1/2?sceneID=S2B_CLEAR&viewId=")
        .await;
    assert_eq!(&response.bytes[..], TILE_BYTES);

    let hits = app.provider.hits_to("/api/render");
    assert_eq!(hits[0].path, "/api/render/S2B_CLEAR/B04,B03,B02/3/1/2");
    assert!(hits[0].query.as_deref().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_missing_identifier_degrades_without_upstream_call() {
    let app = spawn_app().await;

    let response = app.client.get("/api/imagery/tiles/3/1/2").await;
    assert_fallback(&response, None);
    assert_eq!(response.header("x-provider-error"), Some("no identifier provided"));
    assert!(app.provider.hits().is_empty());
}

#[tokio::test]
async fn test_upstream_failures_degrade_to_transparent_tile() {
    let app = spawn_app().await;
    let uri = format!("/api/imagery/tiles/3/1/2?viewId={VIEW_ID}");

    for (status, error_type) in [
        (StatusCode::TOO_MANY_REQUESTS, "rate_limit"),
        (StatusCode::NOT_FOUND, "not_found"),
        (StatusCode::INTERNAL_SERVER_ERROR, "error"),
        (StatusCode::FORBIDDEN, "error"),
    ] {
        app.provider.configure(|b| b.tile_status = status);
        let response = app.client.get(&uri).await;
        assert_fallback(&response, Some(error_type));
    }
    assert_eq!(app.provider.hits_to("/api/render").len(), 4);
}

#[tokio::test]
async fn test_upstream_timeout_degrades_to_transparent_tile() {
    let app = spawn_app_with(|c| c.provider_timeout_secs = 1).await;
    app.provider
        .configure(|b| b.tile_delay = Some(Duration::from_secs(3)));

    let response = app
        .client
        .get(&format!("/api/imagery/tiles/3/1/2?viewId={VIEW_ID}"))
        .await;
    assert_fallback(&response, Some("error"));
    assert_eq!(app.provider.hits_to("/api/render").len(), 1);
}

#[tokio::test]
async fn test_non_image_success_degrades() {
    let app = spawn_app().await;
    app.provider
        .configure(|b| b.tile_content_type = "application/json");

    let response = app
        .client
        .get(&format!("/api/imagery/tiles/3/1/2?viewId={VIEW_ID}"))
        .await;
    assert_fallback(&response, Some("error"));
    assert_ne!(&response.bytes[..], TILE_BYTES);
}

#[tokio::test]
async fn test_invalid_coordinates_degrade_without_upstream_call() {
    let app = spawn_app().await;

    for coords in ["2/4/1", "abc/1/1", "30/0/0", "3/-1/2"] {
        let response = app
            .client
            .get(&format!("/api/imagery/tiles/{coords}?viewId={VIEW_ID}"))
            .await;
        assert_fallback(&response, Some("not_found"));
    }
    assert!(app.provider.hits().is_empty());
}

#[tokio::test]
async fn test_fractional_coordinates_are_truncated() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(&format!("/api/imagery/tiles/3.0/1.7/2.2?viewId={VIEW_ID}"))
        .await;
    assert_eq!(&response.bytes[..], TILE_BYTES);
    assert!(app.provider.hits()[0].path.ends_with("/3/1/2"));
}

#[tokio::test]
async fn test_missing_key_degrades() {
    let app = spawn_app_with(|c| c.provider_api_key = None).await;

    let response = app
        .client
        .get(&format!("/api/imagery/tiles/3/1/2?viewId={VIEW_ID}"))
        .await;
    assert_fallback(&response, Some("error"));
    assert!(app.provider.hits().is_empty());
}
