// Scheduled ingestion: bearer auth, per-item reports, idempotent upserts

use crate::common::db::{seed_farm, seed_farm_with_field, seed_field};
use crate::common::fixtures::{recent_scenes, zoning_finished};
use crate::common::{spawn_app, spawn_app_with};
use agri_imagery_api::routes::analysis::{snapshots::db as snapshot, weather::db as weather_day};
use agri_imagery_api::routes::zoning::db as productivity_map;
use axum::http::StatusCode;
use chrono::NaiveDate;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

const REFRESH: &str = "/api/imagery/cron/refresh-satellite";
const ANALYTICS: &str = "/api/imagery/cron/analytics";
const SECRET: &str = "test-cron-secret";

#[tokio::test]
async fn test_cron_requires_bearer_secret() {
    let app = spawn_app().await;

    for uri in [REFRESH, ANALYTICS] {
        let response = app.client.get(uri).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json()["kind"], "unauthorized");

        let response = app.client.clone().with_auth("wrong-secret").get(uri).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
    assert!(app.provider.hits().is_empty());
}

#[tokio::test]
async fn test_cron_without_configured_secret_is_unavailable() {
    let app = spawn_app_with(|c| c.cron_secret = None).await;

    let response = app.client.clone().with_auth(SECRET).get(REFRESH).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json()["kind"], "configuration");
}

#[tokio::test]
async fn test_cron_without_provider_key_is_unavailable() {
    let app = spawn_app_with(|c| c.provider_api_key = None).await;

    let response = app.client.clone().with_auth(SECRET).get(ANALYTICS).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_refresh_records_scene_statistics_once() {
    let app = spawn_app().await;
    let (farm, field) = seed_farm_with_field(&app.db).await;
    seed_field(&app.db, farm.id, None, None).await.unwrap();
    app.provider.configure(|b| {
        b.search_body = recent_scenes();
        b.means.insert("2025-06-10".to_string(), 0.71);
        b.means.insert("2025-06-08".to_string(), 0.66);
    });
    let cron = app.client.clone().with_auth(SECRET);

    let response = cron.get(REFRESH).await;
    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["fieldsProcessed"], 1);
    assert_eq!(body["totalReadings"], 2);
    assert_eq!(body["results"][0]["fieldId"], field.id.to_string());
    assert_eq!(body["results"][0]["status"], "success");

    let search = &app.provider.hits_to("/api/lms/search")[0];
    assert_eq!(search.body.as_ref().unwrap()["limit"], 3);
    let stats = app.provider.hits_to("/v1/statistics/NDVI");
    assert_eq!(stats.len(), 2);
    assert_eq!(
        stats[0].body.as_ref().unwrap()["datetime"],
        "2025-06-10/2025-06-10"
    );

    // A second run rewrites the same readings
    cron.get(REFRESH).await.assert_status(StatusCode::OK);
    let rows = snapshot::Entity::find().all(&app.db).await.unwrap();
    assert_eq!(rows.len(), 2);
    let latest = rows.iter().find(|r| r.scene_id == "S2A_RECENT_1").unwrap();
    assert_eq!(latest.field_id, field.id);
    assert_eq!(latest.index_type, "NDVI");
    assert_eq!(latest.mean, Some(0.71));
    assert_eq!(latest.cloud_coverage, Some(2.0));
}

#[tokio::test]
async fn test_refresh_reports_failing_fields() {
    let app = spawn_app().await;
    seed_farm_with_field(&app.db).await;
    app.provider
        .configure(|b| b.search_status = StatusCode::TOO_MANY_REQUESTS);

    let response = app.client.clone().with_auth(SECRET).get(REFRESH).await;
    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["totalReadings"], 0);
    assert_eq!(body["results"][0]["status"], "error");
    assert_eq!(body["results"][0]["error"]["kind"], "rate_limited");
    assert_eq!(snapshot::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_analytics_aggregates_weather_per_day() {
    let app = spawn_app().await;
    let (farm, _) = seed_farm_with_field(&app.db).await;
    seed_farm(&app.db, None).await.unwrap();
    let cron = app.client.clone().with_auth(SECRET);

    let response = cron.get(ANALYTICS).await;
    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["farmsProcessed"], 1);
    assert_eq!(body["weatherDays"], 2);
    assert_eq!(body["mapsChecked"], 0);
    assert_eq!(body["farms"][0]["farmId"], farm.id.to_string());

    let request = &app.provider.hits_to("/v1/weather")[0];
    let query = request.query.as_deref().unwrap();
    assert!(query.contains("lat=25.25"));
    assert!(query.contains("lon=32.55"));
    assert!(query.contains("hours=24"));

    // Re-ingesting the same window keeps one row per day
    cron.get(ANALYTICS).await.assert_status(StatusCode::OK);
    let days = weather_day::Entity::find().all(&app.db).await.unwrap();
    assert_eq!(days.len(), 2);

    let first = days
        .iter()
        .find(|d| d.date == NaiveDate::from_ymd_opt(2025, 6, 10).unwrap())
        .unwrap();
    assert_eq!(first.farm_id, farm.id);
    assert_eq!(first.sample_count, 3);
    assert_eq!(first.temperature, Some(24.0));
    assert_eq!(first.wind_speed, Some(3.0));
    assert_eq!(first.precipitation, Some(0.5));
    assert_eq!(first.weather_condition.as_deref(), Some("Sunny"));

    let second = days
        .iter()
        .find(|d| d.date == NaiveDate::from_ymd_opt(2025, 6, 11).unwrap())
        .unwrap();
    assert_eq!(second.sample_count, 1);
    assert_eq!(second.temperature, Some(16.0));
    assert!(second.humidity.is_none());
}

#[tokio::test]
async fn test_analytics_advances_pending_zoning_maps() {
    let app = spawn_app().await;
    let (_, field) = seed_farm_with_field(&app.db).await;
    app.client
        .post("/api/imagery/zoning/create", &json!({ "fieldId": field.id }))
        .await
        .assert_status(StatusCode::OK);
    let cron = app.client.clone().with_auth(SECRET);

    let response = cron.get(ANALYTICS).await;
    assert_eq!(response.json()["mapsChecked"], 1);
    assert_eq!(response.json()["maps"][0]["mapStatus"], "processing");

    app.provider.configure(|b| b.zoning_status = zoning_finished());
    let response = cron.get(ANALYTICS).await;
    assert_eq!(response.json()["maps"][0]["status"], "success");
    assert_eq!(response.json()["maps"][0]["mapStatus"], "completed");

    let map = productivity_map::Entity::find().one(&app.db).await.unwrap().unwrap();
    assert_eq!(map.status, "completed");
    assert!(map.zones.is_some());

    // Finished maps are no longer checked
    let response = cron.get(ANALYTICS).await;
    assert_eq!(response.json()["mapsChecked"], 0);
}
