// Change detection: diff templates, diff tiles, statistics comparison

use crate::common::db::{seed_farm, seed_farm_with_field, seed_field};
use crate::common::fixtures::{TILE_BYTES, change_scenes};
use crate::common::{spawn_app, spawn_app_with};
use agri_imagery_api::routes::change_detection::db as change_alert;
use axum::http::StatusCode;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_diff_returns_proxied_template() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(
            "/api/imagery/change-detection/diff",
            &json!({ "viewId1": "S2/36/R/VU/2025-05-01/0", "viewId2": "S2/36/R/VU/2025-06-01/0" }),
        )
        .await;
    response.assert_status(StatusCode::OK);

    let tile_url = response.json()["tileUrl"].as_str().unwrap();
    assert_eq!(
        tile_url,
        "/api/imagery/change-detection/tiles/{z}/{x}/{y}?viewId1=S2%2F36%2FR%2FVU%2F2025-05-01%2F0&viewId2=S2%2F36%2FR%2FVU%2F2025-06-01%2F0&index=NDVI"
    );
    assert!(!tile_url.contains("test-api-key"));
    assert_eq!(response.json()["legend"]["colors"].as_array().unwrap().len(), 3);
    assert!(app.provider.hits().is_empty());
}

#[tokio::test]
async fn test_diff_requires_both_views() {
    let app = spawn_app().await;

    let response = app
        .client
        .post("/api/imagery/change-detection/diff", &json!({ "viewId1": "S2/A" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json()["error"].as_str().unwrap().contains("viewId2"));
}

#[tokio::test]
async fn test_diff_tile_is_proxied() {
    let app = spawn_app().await;

    let response = app
        .client
        .get("/api/imagery/change-detection/tiles/3/1/2?viewId1=S2%2FA&viewId2=S2%2FB&index=ndmi")
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(&response.bytes[..], TILE_BYTES);
    assert_eq!(response.header("cache-control"), Some("public, max-age=3600"));

    let hit = &app.provider.hits_to("/v1/render/sentinel2/diff")[0];
    assert_eq!(hit.path, "/v1/render/sentinel2/diff/ndmi/3/1/2");
    let query = hit.query.as_deref().unwrap();
    assert!(query.contains("scene1=S2%2FA"));
    assert!(query.contains("scene2=S2%2FB"));
    assert!(query.contains("colormap=RdYlGn"));
}

#[tokio::test]
async fn test_diff_tile_degrades() {
    let app = spawn_app().await;

    let response = app
        .client
        .get("/api/imagery/change-detection/tiles/3/1/2?viewId1=S2%2FA")
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("x-provider-error"), Some("no identifier provided"));

    app.provider.configure(|b| b.tile_status = StatusCode::TOO_MANY_REQUESTS);
    let response = app
        .client
        .get("/api/imagery/change-detection/tiles/3/1/2?viewId1=S2%2FA&viewId2=S2%2FB")
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.header("x-provider-error-type"), Some("rate_limit"));
    assert_eq!(response.header("cache-control"), Some("no-cache"));
}

#[tokio::test]
async fn test_analyze_records_significant_change() {
    let app = spawn_app().await;
    let (_, field) = seed_farm_with_field(&app.db).await;
    app.provider.configure(|b| {
        b.search_body = change_scenes();
        b.means.insert("2025-05-01".to_string(), 0.5);
        b.means.insert("2025-06-01".to_string(), 0.6);
    });

    let response = app
        .client
        .post(
            "/api/imagery/change-detection/analyze",
            &json!({
                "fieldId": field.id,
                "date1": "2025-05-01",
                "date2": "2025-06-01",
                "createAlert": true
            }),
        )
        .await;
    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["changePercentage"], 20.0);
    assert_eq!(body["changeType"], "positive");
    assert_eq!(body["isSignificant"], true);
    assert_eq!(body["baselineStats"]["mean"], 0.5);
    assert_eq!(body["comparisonStats"]["mean"], 0.6);

    let alert_id = Uuid::parse_str(body["alertId"].as_str().unwrap()).unwrap();
    let alert = change_alert::Entity::find_by_id(alert_id)
        .one(&app.db)
        .await
        .unwrap()
        .expect("alert stored");
    assert_eq!(alert.field_id, field.id);
    assert_eq!(alert.change_type, "positive");
    assert_eq!(alert.status, "unread");
    assert_eq!(alert.vegetation_index, "NDVI");

    let searches = app.provider.hits_to("/api/lms/search");
    assert_eq!(searches.len(), 2);
    for search in &searches {
        let filters = &search.body.as_ref().unwrap()["search"];
        assert_eq!(filters["date"]["from"], filters["date"]["to"]);
        assert_eq!(filters["cloudCoverage"]["to"], 100.0);
    }

    let requests = app.provider.hits_to("/v1/statistics/NDVI");
    assert_eq!(requests.len(), 2);
    let baseline = requests
        .iter()
        .map(|r| r.body.as_ref().unwrap())
        .find(|body| body["datetime"] == "2025-05-01/2025-05-01")
        .expect("baseline statistics requested");
    assert_eq!(baseline["view_id"], "S2/36/R/VV/2025-05-01/0");
    assert_eq!(baseline["geometry"]["type"], "Polygon");
}

#[tokio::test]
async fn test_analyze_without_scene_on_date() {
    let app = spawn_app().await;
    let (_, field) = seed_farm_with_field(&app.db).await;
    app.provider.configure(|b| {
        b.search_body = change_scenes();
        b.means.insert("2025-05-01".to_string(), 0.5);
        b.means.insert("2025-07-01".to_string(), 0.6);
    });

    let response = app
        .client
        .post(
            "/api/imagery/change-detection/analyze",
            &json!({
                "fieldId": field.id,
                "date1": "2025-05-01",
                "date2": "2025-07-01",
                "createAlert": true
            }),
        )
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"], "no scene available for 2025-07-01");
    assert!(app.provider.hits_to("/v1/statistics").is_empty());
    assert_eq!(change_alert::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_analyze_small_change_creates_no_alert() {
    let app = spawn_app().await;
    let farm = seed_farm(&app.db, None).await.unwrap();
    let field = seed_field(&app.db, farm.id, Some((25.25, 32.55)), None)
        .await
        .unwrap();
    app.provider.configure(|b| {
        b.search_body = change_scenes();
        b.means.insert("2025-05-01".to_string(), 0.5);
        b.means.insert("2025-06-01".to_string(), 0.48);
    });

    let response = app
        .client
        .post(
            "/api/imagery/change-detection/analyze",
            &json!({
                "fieldId": field.id,
                "date1": "2025-05-01",
                "date2": "2025-06-01",
                "createAlert": true
            }),
        )
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json()["changePercentage"], -4.0);
    assert_eq!(response.json()["changeType"], "neutral");
    assert_eq!(response.json()["isSignificant"], false);
    assert!(response.json()["alertId"].is_null());
    assert_eq!(change_alert::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_analyze_without_baseline_data() {
    let app = spawn_app().await;
    let (_, field) = seed_farm_with_field(&app.db).await;
    app.provider.configure(|b| {
        b.search_body = change_scenes();
        b.means.insert("2025-06-01".to_string(), 0.6);
    });

    let response = app
        .client
        .post(
            "/api/imagery/change-detection/analyze",
            &json!({ "fieldId": field.id, "date1": "2025-05-01", "date2": "2025-06-01" }),
        )
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json()["error"], "no valid data for baseline date");
}

#[tokio::test]
async fn test_analyze_validation() {
    let app = spawn_app().await;
    let farm = seed_farm(&app.db, None).await.unwrap();
    let unlocated = seed_field(&app.db, farm.id, None, None).await.unwrap();

    let cases = [
        (json!({ "date1": "2025-05-01", "date2": "2025-06-01" }), StatusCode::BAD_REQUEST),
        (
            json!({ "fieldId": Uuid::new_v4(), "date1": "01/05/2025", "date2": "2025-06-01" }),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({ "fieldId": Uuid::new_v4(), "date1": "2025-05-01", "date2": "2025-06-01", "index": "ND VI" }),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({ "fieldId": Uuid::new_v4(), "date1": "2025-05-01", "date2": "2025-06-01" }),
            StatusCode::NOT_FOUND,
        ),
        (
            json!({ "fieldId": unlocated.id, "date1": "2025-05-01", "date2": "2025-06-01" }),
            StatusCode::BAD_REQUEST,
        ),
    ];
    for (body, expected) in cases {
        let response = app
            .client
            .post("/api/imagery/change-detection/analyze", &body)
            .await;
        response.assert_status(expected);
    }
    assert!(app.provider.hits().is_empty());
}

#[tokio::test]
async fn test_analyze_without_key_is_unavailable() {
    let app = spawn_app_with(|c| c.provider_api_key = None).await;
    let (_, field) = seed_farm_with_field(&app.db).await;

    let response = app
        .client
        .post(
            "/api/imagery/change-detection/analyze",
            &json!({ "fieldId": field.id, "date1": "2025-05-01", "date2": "2025-06-01" }),
        )
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}
